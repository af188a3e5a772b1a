//! Pause gate - the ledger's circuit breaker

use tokenforge_core::{LedgerError, Principal, Result};

/// Global pause flag with the audit trail of its last change
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PauseGate {
    paused: bool,
    reason: Option<String>,
    changed_by: Option<Principal>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn restore(
        paused: bool,
        reason: Option<String>,
        changed_by: Option<Principal>,
    ) -> Self {
        Self {
            paused,
            reason,
            changed_by,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reason given for the most recent pause, kept after unpausing
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Principal that last toggled the gate
    pub fn changed_by(&self) -> Option<Principal> {
        self.changed_by
    }

    /// Fail with `Paused` while the gate is closed
    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            Err(LedgerError::Paused)
        } else {
            Ok(())
        }
    }

    pub fn pause(&mut self, by: Principal, reason: String) -> Result<()> {
        if self.paused {
            return Err(LedgerError::AlreadyPaused);
        }
        self.paused = true;
        self.reason = Some(reason);
        self.changed_by = Some(by);
        Ok(())
    }

    pub fn unpause(&mut self, by: Principal) -> Result<()> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        self.changed_by = Some(by);
        Ok(())
    }
}
