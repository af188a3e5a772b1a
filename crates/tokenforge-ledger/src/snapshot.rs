//! Persistable image of a whole ledger

use crate::events::EventRecord;
use crate::token::TokenMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokenforge_core::{Amount, LedgerError, Principal, Result, Role};

/// Current snapshot layout version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One non-zero allowance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub owner: Principal,
    pub spender: Principal,
    pub amount: Amount,
}

/// Complete ledger state
///
/// Tables are sorted by principal so two snapshots of the same state encode
/// to the same bytes. Role members keep their grant order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub format_version: u32,
    pub metadata: TokenMetadata,
    pub balances: Vec<(Principal, Amount)>,
    pub allowances: Vec<AllowanceEntry>,
    pub roles: Vec<(Role, Vec<Principal>)>,
    pub total_supply: Amount,
    pub paused: bool,
    pub pause_reason: Option<String>,
    pub pause_changed_by: Option<Principal>,
    pub events: Vec<EventRecord>,
}

impl LedgerSnapshot {
    /// Reject duplicate keys and null principals in the tables
    ///
    /// Conservation and ceiling are checked after the tables are loaded.
    pub fn validate_tables(&self) -> Result<()> {
        let mut holders = HashSet::with_capacity(self.balances.len());
        for (principal, _) in &self.balances {
            if principal.is_zero() {
                return Err(violation("null principal holds a balance"));
            }
            if !holders.insert(*principal) {
                return Err(violation(format!("duplicate balance for {principal}")));
            }
        }

        let mut pairs = HashSet::with_capacity(self.allowances.len());
        for entry in &self.allowances {
            if entry.owner.is_zero() || entry.spender.is_zero() {
                return Err(violation("allowance involves the null principal"));
            }
            if !pairs.insert((entry.owner, entry.spender)) {
                return Err(violation(format!(
                    "duplicate allowance {} -> {}",
                    entry.owner, entry.spender
                )));
            }
        }

        let mut roles = HashSet::with_capacity(self.roles.len());
        for (role, members) in &self.roles {
            if !roles.insert(*role) {
                return Err(violation(format!("role {role} listed twice")));
            }
            let unique: HashSet<_> = members.iter().collect();
            if unique.len() != members.len() {
                return Err(violation(format!("role {role} has duplicate members")));
            }
        }
        Ok(())
    }
}

fn violation(message: impl Into<String>) -> LedgerError {
    LedgerError::InvariantViolation(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenForge;

    fn snapshot() -> LedgerSnapshot {
        TokenForge::deploy(Principal::from_public_key(b"owner"))
            .unwrap()
            .snapshot()
    }

    #[test]
    fn test_fresh_snapshot_is_valid() {
        let snapshot = snapshot();
        assert_eq!(snapshot.format_version, SNAPSHOT_FORMAT_VERSION);
        assert_eq!(snapshot.balances.len(), 1);
        assert_eq!(snapshot.roles.len(), Role::ALL.len());
        assert_eq!(snapshot.events.len(), 5);
        assert!(snapshot.validate_tables().is_ok());
    }

    #[test]
    fn test_duplicate_balance_rejected() {
        let mut snapshot = snapshot();
        let entry = snapshot.balances[0];
        snapshot.balances.push(entry);
        assert!(matches!(
            snapshot.validate_tables(),
            Err(LedgerError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_duplicate_role_member_rejected() {
        let mut snapshot = snapshot();
        let owner = snapshot.metadata.owner;
        snapshot.roles[1].1.push(owner);
        assert!(snapshot.validate_tables().is_err());
    }

    #[test]
    fn test_null_allowance_rejected() {
        let mut snapshot = snapshot();
        snapshot.allowances.push(AllowanceEntry {
            owner: snapshot.metadata.owner,
            spender: Principal::ZERO,
            amount: 1,
        });
        assert!(snapshot.validate_tables().is_err());
    }
}
