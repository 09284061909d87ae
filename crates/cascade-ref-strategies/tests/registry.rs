mod common;

use std::sync::Arc;

use cascade_contracts::{
    account::AssetId,
    error::CascadeError,
    event::VaultEvent,
    role::Role,
    timelock::AdminOutcome,
    MAX_STRATEGIES,
};
use cascade_core::traits::StrategyHandle;
use cascade_ref_strategies::{
    deployment::{ADMIN, MANAGER},
    CappedStrategy, Deployment,
};

use common::{acct, alice, deploy, held};

fn handle(deployment: &Deployment, name: &str) -> StrategyHandle {
    Arc::new(deployment.strategy(name))
}

fn names(deployment: &Deployment) -> Vec<String> {
    deployment
        .vault
        .strategies()
        .unwrap()
        .iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

// ── Adding ────────────────────────────────────────────────────────────────────

#[test]
fn added_strategies_keep_their_order() {
    let deployment = Deployment::reference().unwrap();
    let batch = [
        handle(&deployment, "a"),
        handle(&deployment, "b"),
        handle(&deployment, "c"),
    ];

    assert_eq!(deployment.install(&batch).unwrap(), AdminOutcome::Executed);

    assert_eq!(names(&deployment), ["a", "b", "c"]);
    assert_eq!(
        deployment.log.events(),
        vec![
            VaultEvent::StrategyAdded { strategy: acct("a"), position: 0 },
            VaultEvent::StrategyAdded { strategy: acct("b"), position: 1 },
            VaultEvent::StrategyAdded { strategy: acct("c"), position: 2 },
        ]
    );
}

#[test]
fn duplicate_is_rejected_and_batch_rolled_back() {
    let deployment = Deployment::reference().unwrap();
    deployment.install(&[handle(&deployment, "a")]).unwrap();

    let result = deployment.install(&[handle(&deployment, "b"), handle(&deployment, "a")]);

    match result {
        Err(CascadeError::DuplicateOrInvalidStrategy { strategy }) => {
            assert_eq!(strategy, acct("a"))
        }
        other => panic!("expected DuplicateOrInvalidStrategy, got {:?}", other),
    }
    assert_eq!(names(&deployment), ["a"]);
    assert_eq!(deployment.log.len(), 1);
}

#[test]
fn capacity_is_enforced() {
    let deployment = Deployment::reference().unwrap();
    let full: Vec<StrategyHandle> = (0..MAX_STRATEGIES)
        .map(|i| handle(&deployment, &format!("s{i}")))
        .collect();
    deployment.install(&full).unwrap();

    assert_eq!(
        deployment.install(&[handle(&deployment, "overflow")]),
        Err(CascadeError::CapacityExceeded { max: MAX_STRATEGIES })
    );
    assert_eq!(deployment.vault.strategies_count().unwrap(), MAX_STRATEGIES);
}

#[test]
fn mismatched_asset_or_authority_is_rejected() {
    let deployment = Deployment::reference().unwrap();
    let wrong_asset: StrategyHandle =
        Arc::new(deployment.strategy("dai-pool").with_asset(AssetId::new("dai")));
    let wrong_authority: StrategyHandle = Arc::new(CappedStrategy::new(
        "rogue",
        acct("someone-else"),
        deployment.token.clone(),
    ));

    assert!(matches!(
        deployment.install(&[wrong_asset]),
        Err(CascadeError::DuplicateOrInvalidStrategy { .. })
    ));
    assert!(matches!(
        deployment.install(&[wrong_authority]),
        Err(CascadeError::DuplicateOrInvalidStrategy { .. })
    ));
    assert_eq!(deployment.vault.strategies_count().unwrap(), 0);
}

#[test]
fn null_strategy_is_rejected() {
    let deployment = Deployment::reference().unwrap();
    assert_eq!(
        deployment.install(&[handle(&deployment, "")]),
        Err(CascadeError::NullReference)
    );
}

#[test]
fn adding_requires_vault_manager() {
    let deployment = Deployment::reference().unwrap();
    match deployment.vault.add_strategies(&alice(), &[handle(&deployment, "a")]) {
        Err(CascadeError::Unauthorized { account, role }) => {
            assert_eq!(account, alice());
            assert_eq!(role, Role::VaultManager);
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

// ── Reordering ────────────────────────────────────────────────────────────────

#[test]
fn reorder_changes_waterfall_priority() {
    let (deployment, _) = deploy(&[Some(50), Some(50)], 1_000);
    let manager = acct(MANAGER);

    deployment
        .vault
        .reorder_strategies(&manager, &[acct("s1"), acct("s0")])
        .unwrap();
    deployment.vault.deposit(&alice(), 60, &alice()).unwrap();

    assert_eq!(names(&deployment), ["s1", "s0"]);
    assert_eq!(held(&deployment, "s1"), 50);
    assert_eq!(held(&deployment, "s0"), 10);
}

#[test]
fn reorder_must_be_a_permutation() {
    let (deployment, _) = deploy(&[None, None], 0);
    let manager = acct(MANAGER);

    assert_eq!(
        deployment.vault.reorder_strategies(&manager, &[acct("s0")]),
        Err(CascadeError::LengthMismatch { expected: 2, actual: 1 })
    );
    assert!(matches!(
        deployment.vault.reorder_strategies(&manager, &[acct("s0"), acct("s0")]),
        Err(CascadeError::DuplicateOrInvalidStrategy { .. })
    ));
    assert!(matches!(
        deployment.vault.reorder_strategies(&manager, &[acct("s0"), acct("ghost")]),
        Err(CascadeError::DuplicateOrInvalidStrategy { .. })
    ));
    assert_eq!(names(&deployment), ["s0", "s1"]);
}

// ── Removing ──────────────────────────────────────────────────────────────────

#[test]
fn removal_migrates_funds_to_receiving_strategy() {
    let (deployment, _) = deploy(&[Some(50), None], 1_000);
    deployment.vault.deposit(&alice(), 120, &alice()).unwrap();

    let outcome = deployment
        .vault
        .remove_strategies(&acct(ADMIN), &[acct("s0")], &acct("s1"))
        .unwrap();

    assert_eq!(outcome, AdminOutcome::Executed);
    assert_eq!(names(&deployment), ["s1"]);
    assert_eq!(held(&deployment, "s0"), 0);
    assert_eq!(held(&deployment, "s1"), 120);
    assert_eq!(deployment.vault.total_assets().unwrap(), 120);
    assert_eq!(deployment.vault.max_withdraw(&alice()).unwrap(), 120);
    assert!(deployment
        .log
        .events()
        .contains(&VaultEvent::StrategyRemoved { strategy: acct("s0") }));
}

#[test]
fn removal_leaves_illiquid_residue_behind() {
    let (deployment, strategies) = deploy(&[Some(50), None], 1_000);
    deployment.vault.deposit(&alice(), 120, &alice()).unwrap();
    strategies[0].update(|p| p.liquidity = Some(20));

    deployment
        .vault
        .remove_strategies(&acct(ADMIN), &[acct("s0")], &acct("s1"))
        .unwrap();

    assert_eq!(held(&deployment, "s0"), 30);
    assert_eq!(held(&deployment, "s1"), 90);
    assert_eq!(deployment.vault.total_assets().unwrap(), 90);
}

#[test]
fn receiving_strategy_must_be_a_remaining_member() {
    let (deployment, _) = deploy(&[None, None], 0);
    let admin = acct(ADMIN);

    assert_eq!(
        deployment.vault.remove_strategies(&admin, &[acct("s0")], &acct("ghost")),
        Err(CascadeError::InvalidStrategy { strategy: acct("ghost") })
    );
    assert_eq!(
        deployment.vault.remove_strategies(&admin, &[acct("s0"), acct("s1")], &acct("s1")),
        Err(CascadeError::InvalidStrategy { strategy: acct("s1") })
    );
    assert_eq!(names(&deployment), ["s0", "s1"]);
}

#[test]
fn removing_an_unknown_strategy_rolls_back_the_batch() {
    let (deployment, _) = deploy(&[None, None, None], 0);

    let result = deployment
        .vault
        .remove_strategies(&acct(ADMIN), &[acct("s0"), acct("ghost")], &acct("s2"));

    assert!(matches!(result, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));
    assert_eq!(names(&deployment), ["s0", "s1", "s2"]);
}
