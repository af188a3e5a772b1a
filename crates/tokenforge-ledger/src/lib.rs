//! # TokenForge Ledger
//!
//! A fungible-token ledger with role-based privileges, an emergency pause
//! and a hard issuance ceiling.
//!
//! ## Components
//!
//! - `AccessControlRegistry` - who holds ADMIN, MINTER, BURNER and PAUSER
//! - `PauseGate` - circuit breaker for value transfers
//! - `SupplyLedger` - balances, allowances and the supply counters
//! - `EventLog` - ordered record of every state transition
//! - `TokenForge` - the caller-facing facade composing all of the above
//!
//! ## Example
//!
//! ```
//! use tokenforge_ledger::prelude::*;
//!
//! let owner = Principal::from_public_key(b"owner");
//! let alice = Principal::from_public_key(b"alice");
//!
//! let token = TokenForge::deploy(owner).unwrap();
//! token.transfer(owner, alice, 1_000 * TOKEN).unwrap();
//!
//! assert_eq!(format_units(token.balance_of(&alice), token.decimals()), "1000.0");
//! ```

pub mod access;
pub mod config;
pub mod events;
pub mod pause;
pub mod snapshot;
pub mod storage;
pub mod supply;
pub mod token;

pub use access::AccessControlRegistry;
pub use config::{DefaultReasons, TokenConfig};
pub use events::{EventLog, EventObserver, EventRecord, LedgerEvent};
pub use pause::PauseGate;
pub use snapshot::{AllowanceEntry, LedgerSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use storage::{FileStore, MemoryStore, SnapshotStore, StoreError};
pub use supply::{SupplyLedger, UNLIMITED_ALLOWANCE};
pub use token::{Receipt, TokenForge, TokenMetadata};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::TokenConfig;
    pub use crate::events::{EventRecord, LedgerEvent};
    pub use crate::storage::{FileStore, SnapshotStore};
    pub use crate::supply::UNLIMITED_ALLOWANCE;
    pub use crate::token::{Receipt, TokenForge};
    pub use tokenforge_core::prelude::*;
}
