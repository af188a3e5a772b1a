//! Error types for TokenForge ledger operations

use crate::types::{Amount, Principal, Role};
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger
///
/// Every variant is a clean refusal: the operation that produced it changed
/// no state and appended no event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // === Authorization ===
    /// Caller lacks the role the operation requires
    #[error("account {account} is missing role {role}")]
    Unauthorized { account: Principal, role: Role },

    // === Pause Gate ===
    /// Value transfer attempted while the ledger is paused
    #[error("ledger is paused")]
    Paused,

    /// Pause requested while already paused
    #[error("ledger is already paused")]
    AlreadyPaused,

    /// Unpause requested while not paused
    #[error("ledger is not paused")]
    NotPaused,

    // === Argument Validation ===
    /// Zero amount where a positive amount is required
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Null principal used as a receiver
    #[error("invalid receiver: {0}")]
    InvalidReceiver(Principal),

    /// Null principal used as a source of funds
    #[error("invalid sender: {0}")]
    InvalidSender(Principal),

    /// Null principal used as a spender
    #[error("invalid spender: {0}")]
    InvalidSpender(Principal),

    // === Accounting ===
    /// Balance too small for the requested debit
    #[error("insufficient balance for {account}: have {balance}, need {needed}")]
    InsufficientBalance {
        account: Principal,
        balance: Amount,
        needed: Amount,
    },

    /// Allowance too small for the requested spend
    #[error("insufficient allowance for {spender} on {owner}: have {allowance}, need {needed}")]
    InsufficientAllowance {
        owner: Principal,
        spender: Principal,
        allowance: Amount,
        needed: Amount,
    },

    /// Mint would push total supply past the ceiling
    #[error("mint of {requested} would exceed max supply (remaining {remaining})")]
    SupplyCeilingExceeded { requested: Amount, remaining: Amount },

    /// Checked arithmetic failed
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // === Lifecycle ===
    /// Deployment parameters are inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal consistency check failed
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),

    // === Persistence ===
    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Stable error code for host-facing responses
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1001,
            Self::Paused => 1002,
            Self::AlreadyPaused => 1003,
            Self::NotPaused => 1004,
            Self::InvalidAmount => 1005,
            Self::InvalidReceiver(_) => 1006,
            Self::InvalidSender(_) => 1007,
            Self::InvalidSpender(_) => 1008,
            Self::InsufficientBalance { .. } => 1009,
            Self::InsufficientAllowance { .. } => 1010,
            Self::SupplyCeilingExceeded { .. } => 1011,
            Self::ArithmeticOverflow => 1012,
            Self::InvalidConfig(_) => 2001,
            Self::InvariantViolation(_) => 2002,
            Self::Storage(_) | Self::Serialization(_) => 3001,
        }
    }

    /// Whether the same call may succeed later without any change by the caller
    ///
    /// Only the pause gate is transient; everything else needs different
    /// arguments or privileges.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Paused)
    }
}
