//! # Access Control Registry
//!
//! Maps each [`Role`] to the ordered set of principals holding it.
//!
//! ## Rules
//!
//! - ADMIN administers every role, itself included.
//! - Granting or revoking requires the caller to hold the admin role of the
//!   target role.
//! - A principal may renounce its own roles; it cannot renounce on behalf of
//!   anyone else.
//! - Enumeration follows grant order. Revocation keeps the order of the
//!   remaining members.
//!
//! Renouncing the last ADMIN is allowed. After that no role can ever be
//! granted or revoked again.

use indexmap::IndexSet;
use std::collections::HashMap;
use tokenforge_core::{LedgerError, Principal, Result, Role};

/// Role membership table owned by one ledger instance
#[derive(Clone, Debug, Default)]
pub struct AccessControlRegistry {
    members: HashMap<Role, IndexSet<Principal>>,
}

impl AccessControlRegistry {
    /// Empty registry (no principal holds any role)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every role granted to `owner`
    pub fn bootstrap(owner: Principal) -> Self {
        let mut registry = Self::new();
        for role in Role::ALL {
            registry.insert(role, owner);
        }
        registry
    }

    /// Rebuild a registry from persisted memberships, preserving order
    pub(crate) fn from_members(entries: impl IntoIterator<Item = (Role, Vec<Principal>)>) -> Self {
        let mut registry = Self::new();
        for (role, principals) in entries {
            for principal in principals {
                registry.insert(role, principal);
            }
        }
        registry
    }

    pub fn has_role(&self, role: Role, principal: &Principal) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(principal))
            .unwrap_or(false)
    }

    /// The role whose members may grant and revoke `role`
    pub fn role_admin(&self, _role: Role) -> Role {
        Role::Admin
    }

    /// Fail with `Unauthorized` unless `principal` holds `role`
    pub fn ensure_role(&self, role: Role, principal: &Principal) -> Result<()> {
        if self.has_role(role, principal) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                account: *principal,
                role,
            })
        }
    }

    /// Grant `role` to `account`
    ///
    /// Returns `false` when the account already held the role.
    pub fn grant_role(
        &mut self,
        caller: &Principal,
        role: Role,
        account: Principal,
    ) -> Result<bool> {
        self.ensure_role(self.role_admin(role), caller)?;
        Ok(self.insert(role, account))
    }

    /// Revoke `role` from `account`
    ///
    /// Returns `false` when the account did not hold the role.
    pub fn revoke_role(
        &mut self,
        caller: &Principal,
        role: Role,
        account: &Principal,
    ) -> Result<bool> {
        self.ensure_role(self.role_admin(role), caller)?;
        Ok(self.remove(role, account))
    }

    /// Drop one of the caller's own roles
    ///
    /// `confirmation` must equal the caller.
    pub fn renounce_role(
        &mut self,
        caller: &Principal,
        role: Role,
        confirmation: &Principal,
    ) -> Result<bool> {
        if caller != confirmation {
            return Err(LedgerError::Unauthorized {
                account: *caller,
                role,
            });
        }
        Ok(self.remove(role, caller))
    }

    /// Members of `role` in grant order
    pub fn members(&self, role: Role) -> Vec<Principal> {
        self.members
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, role: Role) -> usize {
        self.members.get(&role).map(IndexSet::len).unwrap_or(0)
    }

    /// Member of `role` at `index`, in grant order
    pub fn member(&self, role: Role, index: usize) -> Option<Principal> {
        self.members.get(&role).and_then(|set| set.get_index(index).copied())
    }

    /// Every role `principal` holds
    pub fn roles_of(&self, principal: &Principal) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.has_role(*role, principal))
            .collect()
    }

    fn insert(&mut self, role: Role, account: Principal) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    fn remove(&mut self, role: Role, account: &Principal) -> bool {
        self.members
            .get_mut(&role)
            .map(|set| set.shift_remove(account))
            .unwrap_or(false)
    }
}
