//! # Supply Ledger
//!
//! Balance accounting under two invariants:
//!
//! - Conservation: the balances always sum to `total_supply`.
//! - Ceiling: `total_supply` never exceeds `max_supply`.
//!
//! Every operation validates completely before it writes anything, so a
//! failed call leaves the ledger exactly as it found it. All arithmetic is
//! checked and fails with `ArithmeticOverflow` instead of wrapping.
//!
//! The ledger does not know about roles or the pause gate. The facade applies
//! those checks before calling in.

use std::collections::HashMap;
use tokenforge_core::{Amount, LedgerError, Principal, Result};

/// Allowance value treated as an unlimited approval
pub const UNLIMITED_ALLOWANCE: Amount = Amount::MAX;

/// Balances, allowances and supply counters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyLedger {
    balances: HashMap<Principal, Amount>,
    allowances: HashMap<(Principal, Principal), Amount>,
    total_supply: Amount,
    max_supply: Amount,
}

impl SupplyLedger {
    /// Empty ledger with a fixed issuance ceiling
    pub fn new(max_supply: Amount) -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
            max_supply,
        }
    }

    /// Rebuild from persisted tables
    ///
    /// No invariant is checked here; callers run [`SupplyLedger::verify`].
    pub(crate) fn restore(
        balances: impl IntoIterator<Item = (Principal, Amount)>,
        allowances: impl IntoIterator<Item = ((Principal, Principal), Amount)>,
        total_supply: Amount,
        max_supply: Amount,
    ) -> Self {
        Self {
            balances: balances.into_iter().filter(|(_, v)| *v > 0).collect(),
            allowances: allowances.into_iter().filter(|(_, v)| *v > 0).collect(),
            total_supply,
            max_supply,
        }
    }

    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn max_supply(&self) -> Amount {
        self.max_supply
    }

    /// Amount still mintable before the ceiling
    pub fn remaining_supply(&self) -> Amount {
        self.max_supply.saturating_sub(self.total_supply)
    }

    pub fn allowance(&self, owner: &Principal, spender: &Principal) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Accounts with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Principal, &Amount)> {
        self.balances.iter()
    }

    /// Non-zero allowances as `((owner, spender), amount)`
    pub fn allowances(&self) -> impl Iterator<Item = (&(Principal, Principal), &Amount)> {
        self.allowances.iter()
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, to: &Principal, amount: Amount) -> Result<()> {
        if to.is_zero() {
            return Err(LedgerError::InvalidReceiver(*to));
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let remaining = self.remaining_supply();
        if amount > remaining {
            return Err(LedgerError::SupplyCeilingExceeded {
                requested: amount,
                remaining,
            });
        }

        let new_total = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.total_supply = new_total;
        self.set_balance(to, new_balance);
        Ok(())
    }

    /// Destroy `amount` of `from`'s tokens
    pub fn burn(&mut self, from: &Principal, amount: Amount) -> Result<()> {
        if from.is_zero() {
            return Err(LedgerError::InvalidSender(*from));
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let new_balance = self.debited(from, amount)?;
        let new_total = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.total_supply = new_total;
        self.set_balance(from, new_balance);
        Ok(())
    }

    /// Move `amount` from `from` to `to`
    ///
    /// A zero amount is accepted.
    pub fn transfer(&mut self, from: &Principal, to: &Principal, amount: Amount) -> Result<()> {
        let (from_balance, to_balance) = self.check_transfer(from, to, amount)?;
        self.apply_transfer(from, to, from_balance, to_balance);
        Ok(())
    }

    /// Set the amount `spender` may move out of `owner`'s account
    pub fn approve(
        &mut self,
        owner: &Principal,
        spender: &Principal,
        amount: Amount,
    ) -> Result<()> {
        if owner.is_zero() {
            return Err(LedgerError::InvalidSender(*owner));
        }
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender(*spender));
        }
        self.set_allowance(owner, spender, amount);
        Ok(())
    }

    /// Move `amount` from `from` to `to` on `spender`'s allowance
    ///
    /// Returns the allowance left afterwards, or `None` when the approval is
    /// unlimited and was not consumed.
    pub fn transfer_from(
        &mut self,
        spender: &Principal,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<Option<Amount>> {
        let allowance = self.allowance(from, spender);
        let remaining = if allowance == UNLIMITED_ALLOWANCE {
            None
        } else {
            Some(allowance.checked_sub(amount).ok_or(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                allowance,
                needed: amount,
            })?)
        };
        let (from_balance, to_balance) = self.check_transfer(from, to, amount)?;

        if let Some(left) = remaining {
            self.set_allowance(from, spender, left);
        }
        self.apply_transfer(from, to, from_balance, to_balance);
        Ok(remaining)
    }

    /// Sum of all balances, `None` if it does not fit in an [`Amount`]
    pub fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0 as Amount, |acc, v| acc.checked_add(*v))
    }

    /// Check conservation and ceiling
    pub fn verify(&self) -> Result<()> {
        let sum = self.sum_of_balances().ok_or_else(|| {
            LedgerError::InvariantViolation("sum of balances overflows".to_string())
        })?;
        if sum != self.total_supply {
            return Err(LedgerError::InvariantViolation(format!(
                "balances sum to {sum} but total supply is {}",
                self.total_supply
            )));
        }
        if self.total_supply > self.max_supply {
            return Err(LedgerError::InvariantViolation(format!(
                "total supply {} exceeds max supply {}",
                self.total_supply, self.max_supply
            )));
        }
        if self.balances.contains_key(&Principal::ZERO) {
            return Err(LedgerError::InvariantViolation(
                "null principal holds a balance".to_string(),
            ));
        }
        Ok(())
    }

    // === Internal helpers ===

    /// Validate a transfer and compute both resulting balances
    fn check_transfer(
        &self,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<(Amount, Amount)> {
        if from.is_zero() {
            return Err(LedgerError::InvalidSender(*from));
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidReceiver(*to));
        }
        let from_balance = self.debited(from, amount)?;
        if from == to {
            return Ok((from_balance, self.balance_of(to)));
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok((from_balance, to_balance))
    }

    fn apply_transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        from_balance: Amount,
        to_balance: Amount,
    ) {
        if from == to {
            return;
        }
        self.set_balance(from, from_balance);
        self.set_balance(to, to_balance);
    }

    /// Balance of `account` after removing `amount`
    fn debited(&self, account: &Principal, amount: Amount) -> Result<Amount> {
        let balance = self.balance_of(account);
        balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: *account,
                balance,
                needed: amount,
            })
    }

    fn set_balance(&mut self, account: &Principal, amount: Amount) {
        if amount == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, amount);
        }
    }

    fn set_allowance(&mut self, owner: &Principal, spender: &Principal, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
    }
}
