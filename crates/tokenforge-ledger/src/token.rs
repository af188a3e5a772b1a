//! # TokenForge
//!
//! The caller-facing surface of the ledger. It composes the access-control
//! registry, the pause gate, the supply ledger and the event log behind one
//! lock.
//!
//! ## Operation Pipeline
//!
//! ```text
//! caller + op ─► write lock ─► pause gate ─► role check ─► supply ledger ─► event log ─► Receipt
//!                                 │              │               │
//!                                 └──────────────┴───────────────┴─► LedgerError (nothing written)
//! ```
//!
//! Each operation runs entirely under the write lock. It either commits its
//! state change and events together or returns an error having written
//! nothing.
//!
//! | Operation       | Role   | Pause-gated |
//! |-----------------|--------|-------------|
//! | `transfer`      | -      | yes         |
//! | `transfer_from` | -      | yes         |
//! | `approve`       | -      | no          |
//! | `mint`          | MINTER | no          |
//! | `burn`          | -      | no          |
//! | `burn_from`     | BURNER | no          |
//! | `pause`         | PAUSER | -           |
//! | `unpause`       | PAUSER | -           |
//! | role management | ADMIN  | no          |

use crate::access::AccessControlRegistry;
use crate::config::{DefaultReasons, TokenConfig};
use crate::events::{EventLog, EventObserver, EventRecord, LedgerEvent};
use crate::pause::PauseGate;
use crate::snapshot::{AllowanceEntry, LedgerSnapshot, SNAPSHOT_FORMAT_VERSION};
use crate::supply::SupplyLedger;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokenforge_core::{Amount, LedgerError, Principal, Result, Role};

/// Immutable token parameters recorded at deployment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Supply minted to the owner at deployment (base units)
    pub initial_supply: Amount,
    /// Issuance ceiling (base units)
    pub max_supply: Amount,
    /// Principal the ledger was deployed for
    pub owner: Principal,
    /// Deployment timestamp (Unix seconds)
    pub deployed_at: i64,
    pub reasons: DefaultReasons,
}

/// Events appended by one successful operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    pub events: Vec<EventRecord>,
}

impl Receipt {
    /// Event kinds in append order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|r| r.event.kind()).collect()
    }

    /// True when the operation was a no-op (e.g. granting a held role)
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// All mutable ledger state, guarded by a single lock
#[derive(Debug)]
struct LedgerState {
    registry: AccessControlRegistry,
    gate: PauseGate,
    supply: SupplyLedger,
    events: EventLog,
}

impl LedgerState {
    fn commit(&mut self, events: Vec<LedgerEvent>) -> Receipt {
        Receipt {
            events: self.events.append_all(events),
        }
    }
}

/// Role-gated, pausable, supply-capped token ledger
pub struct TokenForge {
    metadata: TokenMetadata,
    state: RwLock<LedgerState>,
}

impl TokenForge {
    /// Deploy with the default TokenForge parameters
    ///
    /// Mints the initial supply to `owner` and grants it every role.
    pub fn deploy(owner: Principal) -> Result<Self> {
        Self::with_config(owner, TokenConfig::default())
    }

    /// Deploy with custom parameters
    pub fn with_config(owner: Principal, config: TokenConfig) -> Result<Self> {
        config.validate()?;
        if owner.is_zero() {
            return Err(LedgerError::InvalidReceiver(owner));
        }
        let initial_supply = config.initial_supply_units()?;
        let max_supply = config.max_supply_units()?;

        let registry = AccessControlRegistry::bootstrap(owner);
        let mut supply = SupplyLedger::new(max_supply);
        let mut genesis = Vec::with_capacity(Role::ALL.len() + 1);
        if initial_supply > 0 {
            supply.mint(&owner, initial_supply)?;
            genesis.push(LedgerEvent::Transfer {
                from: Principal::ZERO,
                to: owner,
                value: initial_supply,
            });
        }
        genesis.extend(Role::ALL.into_iter().map(|role| LedgerEvent::RoleGranted {
            role,
            account: owner,
            sender: owner,
        }));

        let mut state = LedgerState {
            registry,
            gate: PauseGate::new(),
            supply,
            events: EventLog::new(),
        };
        state.commit(genesis);

        let metadata = TokenMetadata {
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            initial_supply,
            max_supply,
            owner,
            deployed_at: chrono::Utc::now().timestamp(),
            reasons: config.reasons,
        };

        tracing::info!(
            owner = %owner,
            symbol = %metadata.symbol,
            initial_supply,
            max_supply,
            "token deployed"
        );

        Ok(Self {
            metadata,
            state: RwLock::new(state),
        })
    }

    /// Restore a ledger from a snapshot, refusing inconsistent state
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(LedgerError::Serialization(format!(
                "unsupported snapshot version {}",
                snapshot.format_version
            )));
        }
        snapshot.validate_tables()?;
        let metadata = snapshot.metadata;
        if metadata.initial_supply > metadata.max_supply {
            return Err(LedgerError::InvariantViolation(
                "initial supply exceeds max supply".to_string(),
            ));
        }

        let supply = SupplyLedger::restore(
            snapshot.balances,
            snapshot
                .allowances
                .into_iter()
                .map(|entry| ((entry.owner, entry.spender), entry.amount)),
            snapshot.total_supply,
            metadata.max_supply,
        );
        supply.verify()?;

        let registry = AccessControlRegistry::from_members(snapshot.roles);
        if registry.member_count(Role::Admin) == 0 {
            tracing::warn!("restored ledger has no admin; roles can no longer change");
        }

        let events = EventLog::from_records(snapshot.events)?;
        let gate = PauseGate::restore(
            snapshot.paused,
            snapshot.pause_reason,
            snapshot.pause_changed_by,
        );

        tracing::info!(
            symbol = %metadata.symbol,
            total_supply = supply.total_supply(),
            events = events.len(),
            "ledger restored from snapshot"
        );

        Ok(Self {
            metadata,
            state: RwLock::new(LedgerState {
                registry,
                gate,
                supply,
                events,
            }),
        })
    }

    /// Capture the complete ledger state
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();

        let mut balances: Vec<(Principal, Amount)> =
            state.supply.holders().map(|(p, v)| (*p, *v)).collect();
        balances.sort();

        let mut allowances: Vec<AllowanceEntry> = state
            .supply
            .allowances()
            .map(|((owner, spender), amount)| AllowanceEntry {
                owner: *owner,
                spender: *spender,
                amount: *amount,
            })
            .collect();
        allowances.sort_by_key(|entry| (entry.owner, entry.spender));

        let roles = Role::ALL
            .into_iter()
            .map(|role| (role, state.registry.members(role)))
            .collect();

        LedgerSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            metadata: self.metadata.clone(),
            balances,
            allowances,
            roles,
            total_supply: state.supply.total_supply(),
            paused: state.gate.is_paused(),
            pause_reason: state.gate.reason().map(str::to_string),
            pause_changed_by: state.gate.changed_by(),
            events: state.events.records().to_vec(),
        }
    }

    // === Metadata ===

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn initial_supply(&self) -> Amount {
        self.metadata.initial_supply
    }

    pub fn max_supply(&self) -> Amount {
        self.metadata.max_supply
    }

    // === Reads ===

    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.state.read().supply.balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().supply.total_supply()
    }

    pub fn remaining_supply(&self) -> Amount {
        self.state.read().supply.remaining_supply()
    }

    pub fn allowance(&self, owner: &Principal, spender: &Principal) -> Amount {
        self.state.read().supply.allowance(owner, spender)
    }

    pub fn paused(&self) -> bool {
        self.state.read().gate.is_paused()
    }

    /// Reason given for the most recent pause
    pub fn pause_reason(&self) -> Option<String> {
        self.state.read().gate.reason().map(str::to_string)
    }

    pub fn has_role(&self, role: Role, account: &Principal) -> bool {
        self.state.read().registry.has_role(role, account)
    }

    pub fn role_admin(&self, role: Role) -> Role {
        self.state.read().registry.role_admin(role)
    }

    pub fn role_members(&self, role: Role) -> Vec<Principal> {
        self.state.read().registry.members(role)
    }

    pub fn role_member_count(&self, role: Role) -> usize {
        self.state.read().registry.member_count(role)
    }

    pub fn role_member(&self, role: Role, index: usize) -> Option<Principal> {
        self.state.read().registry.member(role, index)
    }

    pub fn roles_of(&self, account: &Principal) -> Vec<Role> {
        self.state.read().registry.roles_of(account)
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state.read().events.records().to_vec()
    }

    pub fn events_since(&self, sequence: u64) -> Vec<EventRecord> {
        self.state.read().events.since(sequence).to_vec()
    }

    pub fn events_for(&self, account: &Principal) -> Vec<EventRecord> {
        self.state.read().events.involving(account)
    }

    pub fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    /// Register an observer for every future event
    ///
    /// Observers run synchronously while the ledger's write lock is held,
    /// once all records of an operation are appended. An observer must not
    /// call back into this ledger: the lock is not reentrant and the call
    /// deadlocks. A panicking observer is logged and does not undo the
    /// operation.
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) {
        self.state.write().events.subscribe(observer);
    }

    /// Check conservation and ceiling against the live state
    pub fn verify_invariants(&self) -> Result<()> {
        self.state.read().supply.verify()
    }

    // === Value transfer ===

    /// Move `amount` from the caller to `to`
    pub fn transfer(&self, caller: Principal, to: Principal, amount: Amount) -> Result<Receipt> {
        self.execute("transfer", &caller, |state| {
            state.gate.ensure_not_paused()?;
            state.supply.transfer(&caller, &to, amount)?;
            Ok(vec![LedgerEvent::Transfer {
                from: caller,
                to,
                value: amount,
            }])
        })
    }

    /// Let `spender` move up to `amount` of the caller's tokens
    pub fn approve(
        &self,
        caller: Principal,
        spender: Principal,
        amount: Amount,
    ) -> Result<Receipt> {
        self.execute("approve", &caller, |state| {
            state.supply.approve(&caller, &spender, amount)?;
            Ok(vec![LedgerEvent::Approval {
                owner: caller,
                spender,
                value: amount,
            }])
        })
    }

    /// Move `amount` from `from` to `to` using the caller's allowance
    pub fn transfer_from(
        &self,
        caller: Principal,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<Receipt> {
        self.execute("transfer_from", &caller, |state| {
            state.gate.ensure_not_paused()?;
            let remaining = state.supply.transfer_from(&caller, &from, &to, amount)?;

            let mut events = vec![LedgerEvent::Transfer {
                from,
                to,
                value: amount,
            }];
            if let Some(value) = remaining {
                events.push(LedgerEvent::Approval {
                    owner: from,
                    spender: caller,
                    value,
                });
            }
            Ok(events)
        })
    }

    // === Supply management ===

    /// Create `amount` new tokens for `to` (MINTER only)
    pub fn mint(
        &self,
        caller: Principal,
        to: Principal,
        amount: Amount,
        reason: Option<&str>,
    ) -> Result<Receipt> {
        let reason = reason_or(reason, &self.metadata.reasons.mint);
        self.execute("mint", &caller, |state| {
            state.registry.ensure_role(Role::Minter, &caller)?;
            state.supply.mint(&to, amount)?;
            tracing::info!(minter = %caller, to = %to, amount, reason = %reason, "tokens minted");
            Ok(vec![
                LedgerEvent::TokensMinted {
                    to,
                    amount,
                    reason,
                },
                LedgerEvent::Transfer {
                    from: Principal::ZERO,
                    to,
                    value: amount,
                },
            ])
        })
    }

    /// Destroy `amount` of the caller's own tokens
    pub fn burn(&self, caller: Principal, amount: Amount, reason: Option<&str>) -> Result<Receipt> {
        let reason = reason_or(reason, &self.metadata.reasons.burn);
        self.execute("burn", &caller, |state| {
            state.supply.burn(&caller, amount)?;
            Ok(burn_events(caller, amount, reason))
        })
    }

    /// Destroy `amount` of `from`'s tokens (BURNER only, ignores allowances)
    pub fn burn_from(
        &self,
        caller: Principal,
        from: Principal,
        amount: Amount,
        reason: Option<&str>,
    ) -> Result<Receipt> {
        let reason = reason_or(reason, &self.metadata.reasons.burn_from);
        self.execute("burn_from", &caller, |state| {
            state.registry.ensure_role(Role::Burner, &caller)?;
            state.supply.burn(&from, amount)?;
            tracing::info!(
                burner = %caller,
                from = %from,
                amount,
                reason = %reason,
                "tokens burned by burner"
            );
            Ok(burn_events(from, amount, reason))
        })
    }

    // === Pause gate ===

    /// Block all value transfers (PAUSER only)
    pub fn pause(&self, caller: Principal, reason: Option<&str>) -> Result<Receipt> {
        let reason = reason_or(reason, &self.metadata.reasons.pause);
        self.execute("pause", &caller, |state| {
            state.registry.ensure_role(Role::Pauser, &caller)?;
            state.gate.pause(caller, reason.clone())?;
            tracing::info!(pauser = %caller, reason = %reason, "ledger paused");
            Ok(vec![LedgerEvent::EmergencyPause {
                pauser: caller,
                reason,
            }])
        })
    }

    /// Re-open value transfers (PAUSER only)
    pub fn unpause(&self, caller: Principal) -> Result<Receipt> {
        self.execute("unpause", &caller, |state| {
            state.registry.ensure_role(Role::Pauser, &caller)?;
            state.gate.unpause(caller)?;
            tracing::info!(pauser = %caller, "ledger unpaused");
            Ok(vec![LedgerEvent::EmergencyUnpause { unpauser: caller }])
        })
    }

    // === Role management ===

    /// Grant `role` to `account` (admin of `role` only)
    pub fn grant_role(&self, caller: Principal, role: Role, account: Principal) -> Result<Receipt> {
        self.execute("grant_role", &caller, |state| {
            if !state.registry.grant_role(&caller, role, account)? {
                return Ok(Vec::new());
            }
            tracing::info!(role = %role, account = %account, sender = %caller, "role granted");
            Ok(vec![LedgerEvent::RoleGranted {
                role,
                account,
                sender: caller,
            }])
        })
    }

    /// Revoke `role` from `account` (admin of `role` only)
    pub fn revoke_role(
        &self,
        caller: Principal,
        role: Role,
        account: Principal,
    ) -> Result<Receipt> {
        self.execute("revoke_role", &caller, |state| {
            if !state.registry.revoke_role(&caller, role, &account)? {
                return Ok(Vec::new());
            }
            tracing::info!(role = %role, account = %account, sender = %caller, "role revoked");
            Ok(vec![LedgerEvent::RoleRevoked {
                role,
                account,
                sender: caller,
            }])
        })
    }

    /// Drop one of the caller's own roles; `confirmation` must be the caller
    pub fn renounce_role(
        &self,
        caller: Principal,
        role: Role,
        confirmation: Principal,
    ) -> Result<Receipt> {
        self.execute("renounce_role", &caller, |state| {
            if !state.registry.renounce_role(&caller, role, &confirmation)? {
                return Ok(Vec::new());
            }
            if role == Role::Admin && state.registry.member_count(Role::Admin) == 0 {
                tracing::warn!(
                    account = %caller,
                    "last admin renounced; roles can no longer change"
                );
            }
            Ok(vec![LedgerEvent::RoleRevoked {
                role,
                account: caller,
                sender: caller,
            }])
        })
    }

    // === Internal helpers ===

    /// Run one operation under the write lock and commit its events
    fn execute<F>(&self, operation: &'static str, caller: &Principal, op: F) -> Result<Receipt>
    where
        F: FnOnce(&mut LedgerState) -> Result<Vec<LedgerEvent>>,
    {
        let mut state = self.state.write();
        match op(&mut *state) {
            Ok(events) => {
                let receipt = state.commit(events);
                tracing::debug!(
                    operation,
                    caller = %caller,
                    events = receipt.events.len(),
                    "operation committed"
                );
                Ok(receipt)
            }
            Err(err) => {
                match &err {
                    LedgerError::Unauthorized { role, .. } => {
                        tracing::warn!(
                            operation,
                            caller = %caller,
                            role = %role,
                            "unauthorized call rejected"
                        );
                    }
                    other => {
                        tracing::debug!(
                            operation,
                            caller = %caller,
                            error = %other,
                            "operation rejected"
                        );
                    }
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for TokenForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenForge")
            .field("metadata", &self.metadata)
            .field("state", &*self.state.read())
            .finish()
    }
}

fn reason_or(reason: Option<&str>, default: &str) -> String {
    reason.unwrap_or(default).to_string()
}

fn burn_events(from: Principal, amount: Amount, reason: String) -> Vec<LedgerEvent> {
    vec![
        LedgerEvent::TokensBurned { from, amount, reason },
        LedgerEvent::Transfer {
            from,
            to: Principal::ZERO,
            value: amount,
        },
    ]
}
