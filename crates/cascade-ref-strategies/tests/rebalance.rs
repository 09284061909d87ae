mod common;

use std::sync::Arc;

use cascade_contracts::{error::CascadeError, event::VaultEvent, role::Role};
use cascade_core::traits::StrategyHandle;
use cascade_ref_strategies::{
    deployment::{ADMIN, KEEPER, MANAGER},
    CappedStrategy, Deployment,
};

use common::{acct, alice, deploy, fingerprint, held};

const WATCHED: [&str; 4] = ["alice", "s0", "s1", "cascade-vault"];

/// Two unbounded strategies with 1 000 deposited, all of it in `s0`.
fn funded_pair() -> (Deployment, Vec<Arc<CappedStrategy>>, StrategyHandle) {
    let (deployment, strategies) = deploy(&[None, None], 1_000);
    deployment.vault.deposit(&alice(), 1_000, &alice()).unwrap();
    let source: StrategyHandle = strategies[0].clone();
    (deployment, strategies, source)
}

#[test]
fn rebalance_moves_capital_without_changing_share_value() {
    let (deployment, _, source) = funded_pair();
    let total_before = deployment.vault.total_assets().unwrap();
    let supply_before = deployment.vault.total_supply();
    let value_before = deployment.vault.convert_to_assets(1_000).unwrap();

    let moved = deployment
        .vault
        .rebalance(&acct(KEEPER), &source, &acct("s1"), 400, 400)
        .unwrap();

    assert_eq!(moved, 400);
    assert_eq!(held(&deployment, "s0"), 600);
    assert_eq!(held(&deployment, "s1"), 400);
    assert_eq!(deployment.vault.total_assets().unwrap(), total_before);
    assert_eq!(deployment.vault.total_supply(), supply_before);
    assert_eq!(deployment.vault.convert_to_assets(1_000).unwrap(), value_before);
    assert_eq!(
        deployment.log.events().last(),
        Some(&VaultEvent::Rebalanced {
            from: acct("s0"),
            to: acct("s1"),
            amount: 400,
        })
    );
}

#[test]
fn rebalance_below_minimum_is_rolled_back() {
    let (deployment, strategies, source) = funded_pair();
    strategies[0].update(|p| p.withdraw_haircut_bps = 1_000);
    let before = fingerprint(&deployment, &WATCHED);

    assert_eq!(
        deployment
            .vault
            .rebalance(&acct(KEEPER), &source, &acct("s1"), 100, 100),
        Err(CascadeError::BelowMinimumTransfer {
            actual: 90,
            min_amount: 100,
        })
    );
    assert_eq!(fingerprint(&deployment, &WATCHED), before);
}

#[test]
fn rebalance_deposits_only_what_arrived() {
    let (deployment, strategies, source) = funded_pair();
    strategies[0].update(|p| p.withdraw_haircut_bps = 1_000);

    let moved = deployment
        .vault
        .rebalance(&acct(KEEPER), &source, &acct("s1"), 100, 90)
        .unwrap();

    assert_eq!(moved, 90);
    assert_eq!(held(&deployment, "s1"), 90);
    assert_eq!(held(&deployment, "s0"), 910);
    assert_eq!(deployment.vault.idle_assets(), 0);
}

#[test]
fn rebalance_requires_rebalancer() {
    let (deployment, _, source) = funded_pair();

    for caller in [alice(), acct(MANAGER)] {
        match deployment.vault.rebalance(&caller, &source, &acct("s1"), 1, 0) {
            Err(CascadeError::Unauthorized { role, .. }) => assert_eq!(role, Role::Rebalancer),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }
    assert!(deployment
        .vault
        .rebalance(&acct(ADMIN), &source, &acct("s1"), 1, 1)
        .is_ok());
}

#[test]
fn rebalance_destination_must_be_registered() {
    let (deployment, _, source) = funded_pair();
    assert_eq!(
        deployment
            .vault
            .rebalance(&acct(KEEPER), &source, &acct("ghost"), 1, 0),
        Err(CascadeError::InvalidStrategy { strategy: acct("ghost") })
    );
}

#[test]
fn rebalance_of_zero_is_refused() {
    let (deployment, _, source) = funded_pair();
    assert_eq!(
        deployment.vault.rebalance(&acct(KEEPER), &source, &acct("s1"), 0, 0),
        Err(CascadeError::ZeroAmount)
    );
}

#[test]
fn source_failure_aborts_the_rebalance() {
    let (deployment, _, source) = funded_pair();
    let before = fingerprint(&deployment, &WATCHED);

    assert!(matches!(
        deployment
            .vault
            .rebalance(&acct(KEEPER), &source, &acct("s1"), 2_000, 0),
        Err(CascadeError::StrategyFailure { .. })
    ));
    assert_eq!(fingerprint(&deployment, &WATCHED), before);
}

#[test]
fn residue_of_a_removed_strategy_can_be_recovered() {
    let (deployment, strategies, source) = funded_pair();
    strategies[0].update(|p| p.liquidity = Some(300));

    deployment
        .vault
        .remove_strategies(&acct(ADMIN), &[acct("s0")], &acct("s1"))
        .unwrap();
    assert_eq!(held(&deployment, "s0"), 700);
    assert_eq!(deployment.vault.total_assets().unwrap(), 300);

    strategies[0].update(|p| p.liquidity = None);
    deployment
        .vault
        .rebalance(&acct(KEEPER), &source, &acct("s1"), 700, 700)
        .unwrap();

    assert_eq!(held(&deployment, "s0"), 0);
    assert_eq!(deployment.vault.total_assets().unwrap(), 1_000);
}
