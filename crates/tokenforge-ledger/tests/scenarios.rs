//! Integration tests for the TokenForge ledger facade
//!
//! These tests drive the public operation surface end to end: deployment,
//! minting under the ceiling, the pause gate, burning and role management.

use parking_lot::Mutex;
use std::sync::Arc;
use tokenforge_ledger::prelude::*;
use tokenforge_ledger::TokenMetadata;

fn principal(label: &str) -> Principal {
    Principal::from_public_key(label.as_bytes())
}

struct Fixture {
    token: TokenForge,
    owner: Principal,
    minter: Principal,
    pauser: Principal,
    user: Principal,
}

fn deployed() -> Fixture {
    let owner = principal("owner");
    let minter = principal("minter");
    let pauser = principal("pauser");
    let user = principal("user");

    let token = TokenForge::deploy(owner).unwrap();
    token.grant_role(owner, Role::Minter, minter).unwrap();
    token.grant_role(owner, Role::Pauser, pauser).unwrap();

    Fixture {
        token,
        owner,
        minter,
        pauser,
        user,
    }
}

mod deployment_tests {
    use super::*;

    #[test]
    fn test_deploy_mints_initial_supply() {
        let owner = principal("owner");
        let token = TokenForge::deploy(owner).unwrap();

        assert_eq!(token.total_supply(), 1_000_000_000 * TOKEN);
        assert_eq!(token.remaining_supply(), 9_000_000_000 * TOKEN);
        assert_eq!(token.balance_of(&owner), 1_000_000_000 * TOKEN);
        assert_eq!(token.max_supply(), 10_000_000_000 * TOKEN);
        assert_eq!(format_units(token.total_supply(), token.decimals()), "1000000000.0");
    }

    #[test]
    fn test_deploy_grants_every_role_to_owner() {
        let owner = principal("owner");
        let token = TokenForge::deploy(owner).unwrap();

        for role in Role::ALL {
            assert!(token.has_role(role, &owner), "owner lacks {role}");
            assert_eq!(token.role_members(role), vec![owner]);
            assert_eq!(token.role_admin(role), Role::Admin);
        }
    }

    #[test]
    fn test_deploy_event_sequence() {
        let owner = principal("owner");
        let token = TokenForge::deploy(owner).unwrap();
        let events = token.events();

        assert_eq!(
            events[0].event,
            LedgerEvent::Transfer {
                from: Principal::ZERO,
                to: owner,
                value: INITIAL_SUPPLY
            }
        );
        for (record, role) in events[1..].iter().zip(Role::ALL) {
            assert_eq!(
                record.event,
                LedgerEvent::RoleGranted {
                    role,
                    account: owner,
                    sender: owner
                }
            );
        }
        assert_eq!(events.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_custom_config() {
        let owner = principal("owner");
        let config = TokenConfig {
            name: "Gold".to_string(),
            symbol: "GLD".to_string(),
            decimals: 6,
            initial_supply: "0".to_string(),
            max_supply: "100".to_string(),
            ..TokenConfig::default()
        };
        let token = TokenForge::with_config(owner, config).unwrap();

        assert_eq!(token.symbol(), "GLD");
        assert_eq!(token.total_supply(), 0);
        assert_eq!(token.max_supply(), 100_000_000);
        // No genesis transfer when nothing is minted
        assert_eq!(token.event_count(), Role::ALL.len());
    }

    #[test]
    fn test_independent_instances() {
        let a = deployed();
        let b = TokenForge::deploy(a.owner).unwrap();

        a.token.mint(a.minter, a.user, 10, None).unwrap();
        assert_eq!(a.token.balance_of(&a.user), 10);
        assert_eq!(b.balance_of(&a.user), 0);
        assert!(!b.has_role(Role::Minter, &a.minter));
    }
}

mod supply_tests {
    use super::*;

    #[test]
    fn test_minter_mints_to_user() {
        let f = deployed();
        let before = f.token.total_supply();

        let receipt = f
            .token
            .mint(f.minter, f.user, 1000 * TOKEN, Some("Test mint"))
            .unwrap();

        assert_eq!(f.token.balance_of(&f.user), 1000 * TOKEN);
        assert_eq!(f.token.total_supply(), before + 1000 * TOKEN);
        assert_eq!(
            receipt.events[0].event,
            LedgerEvent::TokensMinted {
                to: f.user,
                amount: 1000 * TOKEN,
                reason: "Test mint".to_string()
            }
        );
        assert_eq!(format_units(f.token.balance_of(&f.user), 18), "1000.0");
    }

    #[test]
    fn test_mint_past_ceiling_changes_nothing() {
        let f = deployed();
        let remaining = f.token.remaining_supply();
        let total = f.token.total_supply();
        let events = f.token.event_count();

        let err = f.token.mint(f.minter, f.user, remaining + 1, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::SupplyCeilingExceeded {
                requested: remaining + 1,
                remaining
            }
        );
        assert_eq!(f.token.total_supply(), total);
        assert_eq!(f.token.balance_of(&f.user), 0);
        assert_eq!(f.token.event_count(), events);

        f.token.mint(f.minter, f.user, remaining, None).unwrap();
        assert_eq!(f.token.total_supply(), MAX_SUPPLY);
        assert_eq!(f.token.remaining_supply(), 0);
    }

    #[test]
    fn test_mint_rejections() {
        let f = deployed();

        assert_eq!(
            f.token.mint(f.user, f.user, 1, None).unwrap_err(),
            LedgerError::Unauthorized {
                account: f.user,
                role: Role::Minter
            }
        );
        assert_eq!(
            f.token.mint(f.minter, Principal::ZERO, 1, None).unwrap_err(),
            LedgerError::InvalidReceiver(Principal::ZERO)
        );
        assert_eq!(
            f.token.mint(f.minter, f.user, 0, None).unwrap_err(),
            LedgerError::InvalidAmount
        );
    }

    #[test]
    fn test_self_burn() {
        let f = deployed();
        f.token.mint(f.minter, f.user, 50 * TOKEN, None).unwrap();
        let total = f.token.total_supply();

        let err = f.token.burn(f.user, 50 * TOKEN + 1, None).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(f.token.balance_of(&f.user), 50 * TOKEN);

        let receipt = f.token.burn(f.user, 50 * TOKEN, Some("cash out")).unwrap();
        assert_eq!(f.token.balance_of(&f.user), 0);
        assert_eq!(f.token.total_supply(), total - 50 * TOKEN);
        assert_eq!(receipt.kinds(), vec!["TokensBurned", "Transfer"]);
        assert_eq!(
            receipt.events[0].event,
            LedgerEvent::TokensBurned {
                from: f.user,
                amount: 50 * TOKEN,
                reason: "cash out".to_string()
            }
        );
    }

    #[test]
    fn test_burn_from_needs_burner_not_allowance() {
        let f = deployed();
        let burner = principal("burner");
        f.token.mint(f.minter, f.user, 100, None).unwrap();

        assert!(matches!(
            f.token.burn_from(burner, f.user, 10, None),
            Err(LedgerError::Unauthorized { role: Role::Burner, .. })
        ));

        f.token.grant_role(f.owner, Role::Burner, burner).unwrap();
        let receipt = f.token.burn_from(burner, f.user, 10, None).unwrap();
        assert_eq!(f.token.balance_of(&f.user), 90);
        assert_eq!(f.token.allowance(&f.user, &burner), 0);
        assert!(matches!(
            &receipt.events[0].event,
            LedgerEvent::TokensBurned { reason, .. } if reason == "Burner burn"
        ));
    }
}

mod transfer_tests {
    use super::*;

    #[test]
    fn test_transfer_and_allowance_flow() {
        let f = deployed();
        let spender = principal("spender");
        let bob = principal("bob");
        f.token.transfer(f.owner, f.user, 100 * TOKEN).unwrap();

        f.token.approve(f.user, spender, 30 * TOKEN).unwrap();
        assert_eq!(f.token.allowance(&f.user, &spender), 30 * TOKEN);

        f.token.transfer_from(spender, f.user, bob, 20 * TOKEN).unwrap();
        assert_eq!(f.token.balance_of(&bob), 20 * TOKEN);
        assert_eq!(f.token.balance_of(&f.user), 80 * TOKEN);
        assert_eq!(f.token.allowance(&f.user, &spender), 10 * TOKEN);

        assert!(matches!(
            f.token.transfer_from(spender, f.user, bob, 11 * TOKEN),
            Err(LedgerError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_unlimited_allowance() {
        let f = deployed();
        let spender = principal("spender");

        f.token.approve(f.owner, spender, UNLIMITED_ALLOWANCE).unwrap();
        let receipt = f.token.transfer_from(spender, f.owner, f.user, TOKEN).unwrap();

        assert_eq!(receipt.kinds(), vec!["Transfer"]);
        assert_eq!(f.token.allowance(&f.owner, &spender), UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn test_transfer_to_null_rejected() {
        let f = deployed();
        assert_eq!(
            f.token.transfer(f.owner, Principal::ZERO, 1).unwrap_err(),
            LedgerError::InvalidReceiver(Principal::ZERO)
        );
    }
}

mod pause_tests {
    use super::*;

    #[test]
    fn test_pause_blocks_transfers_until_unpaused() {
        let f = deployed();
        f.token.mint(f.minter, f.user, 100, None).unwrap();

        let receipt = f.token.pause(f.pauser, Some("halt")).unwrap();
        assert_eq!(
            receipt.events[0].event,
            LedgerEvent::EmergencyPause {
                pauser: f.pauser,
                reason: "halt".to_string()
            }
        );
        assert!(f.token.paused());
        assert_eq!(f.token.transfer(f.user, f.owner, 10).unwrap_err(), LedgerError::Paused);

        f.token.unpause(f.pauser).unwrap();
        f.token.transfer(f.user, f.owner, 10).unwrap();
        assert_eq!(f.token.balance_of(&f.user), 90);
    }

    #[test]
    fn test_paused_check_precedes_balance_check() {
        let f = deployed();
        f.token.pause(f.pauser, None).unwrap();

        // The user holds nothing, but the gate answers first
        assert_eq!(f.token.transfer(f.user, f.owner, 10).unwrap_err(), LedgerError::Paused);
        assert_eq!(
            f.token.transfer_from(f.user, f.owner, f.user, 10).unwrap_err(),
            LedgerError::Paused
        );
    }

    #[test]
    fn test_mint_and_burn_work_while_paused() {
        let f = deployed();
        f.token.pause(f.pauser, None).unwrap();

        f.token.mint(f.minter, f.user, 5, None).unwrap();
        f.token.burn(f.user, 2, None).unwrap();
        f.token.approve(f.user, f.owner, 1).unwrap();
        assert_eq!(f.token.balance_of(&f.user), 3);
    }

    #[test]
    fn test_toggle_twice_fails() {
        let f = deployed();
        assert_eq!(f.token.unpause(f.pauser).unwrap_err(), LedgerError::NotPaused);
        f.token.pause(f.pauser, None).unwrap();
        assert_eq!(f.token.pause(f.pauser, None).unwrap_err(), LedgerError::AlreadyPaused);
    }

    #[test]
    fn test_role_check_precedes_state_check() {
        let f = deployed();
        assert!(matches!(
            f.token.unpause(f.user),
            Err(LedgerError::Unauthorized { role: Role::Pauser, .. })
        ));
    }
}

mod role_tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke_emit_events() {
        let f = deployed();
        let burner = principal("burner");

        let receipt = f.token.grant_role(f.owner, Role::Burner, burner).unwrap();
        assert_eq!(
            receipt.events[0].event,
            LedgerEvent::RoleGranted {
                role: Role::Burner,
                account: burner,
                sender: f.owner
            }
        );
        assert_eq!(f.token.role_member(Role::Burner, 1), Some(burner));

        let receipt = f.token.revoke_role(f.owner, Role::Burner, burner).unwrap();
        assert_eq!(receipt.kinds(), vec!["RoleRevoked"]);
        assert!(!f.token.has_role(Role::Burner, &burner));
        assert_eq!(f.token.role_member_count(Role::Burner), 1);
    }

    #[test]
    fn test_only_admin_manages_roles() {
        let f = deployed();
        assert!(matches!(
            f.token.grant_role(f.minter, Role::Minter, f.user),
            Err(LedgerError::Unauthorized { role: Role::Admin, .. })
        ));
        assert!(matches!(
            f.token.revoke_role(f.pauser, Role::Pauser, f.owner),
            Err(LedgerError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_role_gating_ignores_other_roles() {
        let f = deployed();
        // Owner holds all four roles; pauser holds only PAUSER
        assert!(f.token.mint(f.pauser, f.user, 1, None).is_err());
        f.token.mint(f.owner, f.user, 1, None).unwrap();
        f.token.grant_role(f.owner, Role::Minter, f.pauser).unwrap();
        f.token.mint(f.pauser, f.user, 1, None).unwrap();
    }

    #[test]
    fn test_renounce_role() {
        let f = deployed();

        assert!(f.token.renounce_role(f.minter, Role::Minter, f.owner).is_err());
        let receipt = f.token.renounce_role(f.minter, Role::Minter, f.minter).unwrap();
        assert_eq!(
            receipt.events[0].event,
            LedgerEvent::RoleRevoked {
                role: Role::Minter,
                account: f.minter,
                sender: f.minter
            }
        );
        assert!(f.token.mint(f.minter, f.user, 1, None).is_err());
    }

    #[test]
    fn test_last_admin_may_renounce() {
        let f = deployed();
        f.token.renounce_role(f.owner, Role::Admin, f.owner).unwrap();

        assert_eq!(f.token.role_member_count(Role::Admin), 0);
        assert!(f.token.grant_role(f.owner, Role::Minter, f.user).is_err());
        // Other roles keep working
        f.token.mint(f.owner, f.user, 1, None).unwrap();
    }
}

mod event_tests {
    use super::*;

    #[test]
    fn test_subscriber_sees_every_event_in_order() {
        let f = deployed();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.token
            .subscribe(Arc::new(move |record: &EventRecord| sink.lock().push(record.clone())));

        let start = f.token.event_count() as u64;
        f.token.mint(f.minter, f.user, 10, None).unwrap();
        f.token.transfer(f.user, f.owner, 4).unwrap();
        let _ = f.token.burn(f.user, 100, None);

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.as_slice(), f.token.events_since(start).as_slice());
        assert!(seen.windows(2).all(|w| w[1].sequence == w[0].sequence + 1));
    }

    #[test]
    fn test_panicking_subscriber_cannot_drop_events() {
        let f = deployed();
        let bob = principal("bob");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.token
            .subscribe(Arc::new(|_: &EventRecord| panic!("subscriber failure")));
        f.token
            .subscribe(Arc::new(move |record: &EventRecord| sink.lock().push(record.sequence)));
        let before = f.token.event_count();

        let receipt = f.token.transfer(f.owner, bob, 7).unwrap();

        assert_eq!(f.token.balance_of(&bob), 7);
        assert_eq!(f.token.event_count(), before + 1);
        let transfers: Vec<_> = f
            .token
            .events_for(&bob)
            .into_iter()
            .filter(|r| r.event == LedgerEvent::Transfer { from: f.owner, to: bob, value: 7 })
            .collect();
        assert_eq!(transfers, receipt.events);
        assert_eq!(*seen.lock(), vec![before as u64]);
        assert!(f.token.verify_invariants().is_ok());

        // The ledger keeps serving after the failure
        f.token.transfer(bob, f.owner, 2).unwrap();
        assert_eq!(f.token.event_count(), before + 2);
    }

    #[test]
    fn test_events_for_principal() {
        let f = deployed();
        f.token.mint(f.minter, f.user, 10, None).unwrap();

        let mine = f.token.events_for(&f.user);
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.event.involves(&f.user)));
    }

    #[test]
    fn test_metadata_type_is_public() {
        let f = deployed();
        let metadata: &TokenMetadata = f.token.metadata();
        assert_eq!(metadata.owner, f.owner);
        assert_eq!(metadata.reasons.mint, "Admin mint");
    }
}
