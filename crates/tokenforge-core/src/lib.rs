//! # TokenForge Core
//!
//! Shared building blocks for the TokenForge token ledger:
//! - `Principal` - account identity (20-byte address, `0x` hex form)
//! - `Role` - ADMIN, MINTER, BURNER and PAUSER capabilities
//! - `Amount` - base-unit integer amounts and fixed-point conversion helpers
//! - `LedgerError` - the refusal taxonomy every ledger operation reports

pub mod error;
pub mod types;
pub mod units;

pub use error::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{LedgerError, Result};
    pub use crate::types::{Amount, Principal, Role};
    pub use crate::units::{format_units, parse_units, DECIMALS, INITIAL_SUPPLY, MAX_SUPPLY, TOKEN};
}
