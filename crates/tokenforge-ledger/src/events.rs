//! # Event Log
//!
//! Append-only record of every ledger state transition.
//!
//! Records are numbered from zero without gaps. The facade appends them inside
//! the same critical section as the state change they describe, so an
//! observer never sees an event before its effect, or an effect without its
//! event.
//!
//! Observers are called synchronously, in sequence order, while the ledger
//! lock is held, after all records of the operation are appended. They must
//! not call back into the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokenforge_core::{Amount, LedgerError, Principal, Result, Role};

/// A ledger state transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Value moved between accounts; `from` is null for mints, `to` for burns
    Transfer {
        from: Principal,
        to: Principal,
        value: Amount,
    },
    /// Allowance set or updated
    Approval {
        owner: Principal,
        spender: Principal,
        value: Amount,
    },
    /// Supply created by a minter
    TokensMinted {
        to: Principal,
        amount: Amount,
        reason: String,
    },
    /// Supply destroyed
    TokensBurned {
        from: Principal,
        amount: Amount,
        reason: String,
    },
    EmergencyPause {
        pauser: Principal,
        reason: String,
    },
    EmergencyUnpause {
        unpauser: Principal,
    },
    RoleGranted {
        role: Role,
        account: Principal,
        sender: Principal,
    },
    RoleRevoked {
        role: Role,
        account: Principal,
        sender: Principal,
    },
}

impl LedgerEvent {
    /// Event name as external observers know it
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::TokensMinted { .. } => "TokensMinted",
            Self::TokensBurned { .. } => "TokensBurned",
            Self::EmergencyPause { .. } => "EmergencyPause",
            Self::EmergencyUnpause { .. } => "EmergencyUnpause",
            Self::RoleGranted { .. } => "RoleGranted",
            Self::RoleRevoked { .. } => "RoleRevoked",
        }
    }

    /// Whether `principal` appears anywhere in the event
    pub fn involves(&self, principal: &Principal) -> bool {
        match self {
            Self::Transfer { from, to, .. } => from == principal || to == principal,
            Self::Approval { owner, spender, .. } => owner == principal || spender == principal,
            Self::TokensMinted { to, .. } => to == principal,
            Self::TokensBurned { from, .. } => from == principal,
            Self::EmergencyPause { pauser, .. } => pauser == principal,
            Self::EmergencyUnpause { unpauser } => unpauser == principal,
            Self::RoleGranted { account, sender, .. }
            | Self::RoleRevoked { account, sender, .. } => {
                account == principal || sender == principal
            }
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer { from, to, value } => write!(f, "Transfer({from} -> {to}, {value})"),
            Self::Approval { owner, spender, value } => {
                write!(f, "Approval({owner} -> {spender}, {value})")
            }
            Self::TokensMinted { to, amount, reason } => {
                write!(f, "TokensMinted({to}, {amount}, {reason:?})")
            }
            Self::TokensBurned { from, amount, reason } => {
                write!(f, "TokensBurned({from}, {amount}, {reason:?})")
            }
            Self::EmergencyPause { pauser, reason } => {
                write!(f, "EmergencyPause({pauser}, {reason:?})")
            }
            Self::EmergencyUnpause { unpauser } => write!(f, "EmergencyUnpause({unpauser})"),
            Self::RoleGranted { role, account, sender } => {
                write!(f, "RoleGranted({role}, {account}, by {sender})")
            }
            Self::RoleRevoked { role, account, sender } => {
                write!(f, "RoleRevoked({role}, {account}, by {sender})")
            }
        }
    }
}

/// An event with its position in the log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: LedgerEvent,
}

/// Callback notified of every appended record
pub trait EventObserver: Send + Sync {
    fn on_event(&self, record: &EventRecord);
}

impl<F> EventObserver for F
where
    F: Fn(&EventRecord) + Send + Sync,
{
    fn on_event(&self, record: &EventRecord) {
        self(record)
    }
}

/// Append-only event sequence plus its subscribers
#[derive(Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    observers: Vec<Arc<dyn EventObserver>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records
    ///
    /// Fails unless the records are numbered `0..n` in order.
    pub fn from_records(records: Vec<EventRecord>) -> Result<Self> {
        if let Some((index, record)) = records
            .iter()
            .enumerate()
            .find(|(index, record)| record.sequence != *index as u64)
        {
            return Err(LedgerError::InvariantViolation(format!(
                "event at position {index} has sequence {}",
                record.sequence
            )));
        }
        Ok(Self {
            records,
            observers: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, observer: Arc<dyn EventObserver>) {
        self.observers.push(observer);
    }

    /// Append events in order, notify observers, and return the new records
    ///
    /// Every record is in the log before any observer runs. A panicking
    /// observer is logged and skipped; it cannot remove records or stop
    /// the remaining observers.
    pub fn append_all(&mut self, events: Vec<LedgerEvent>) -> Vec<EventRecord> {
        let start = self.records.len();
        for event in events {
            let record = EventRecord {
                sequence: self.next_sequence(),
                event,
            };
            self.records.push(record);
        }
        let appended = self.records[start..].to_vec();

        for record in &appended {
            for observer in &self.observers {
                let notified = panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(record)));
                if notified.is_err() {
                    tracing::warn!(sequence = record.sequence, "event observer panicked");
                }
            }
        }
        appended
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Records involving `principal`
    pub fn involving(&self, principal: &Principal) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|record| record.event.involves(principal))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_sequence(&self) -> u64 {
        self.records.len() as u64
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("records", &self.records.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
