mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cascade_contracts::{account::Amount, error::CascadeError};
use cascade_core::traits::StrategyHandle;
use cascade_ref_strategies::{
    deployment::{ADMIN, ALICE, BOB, KEEPER},
    reentrant::Reentry,
    Deployment, ReentrantStrategy,
};

use common::{acct, alice, deploy, fingerprint, held};

const WATCHED: [&str; 4] = ["alice", "evil", "honest", "cascade-vault"];

/// `evil` first, `honest` second, both unbounded. `evil` starts disarmed.
fn deploy_with_attacker() -> (Deployment, Arc<ReentrantStrategy>, StrategyHandle) {
    deploy_with_reentry(Reentry::Skim)
}

fn deploy_with_reentry(reentry: Reentry) -> (Deployment, Arc<ReentrantStrategy>, StrategyHandle) {
    let deployment = Deployment::reference().unwrap();
    let evil = Arc::new(ReentrantStrategy::new(deployment.strategy("evil")).with_reentry(reentry));
    evil.target(&deployment.vault);
    evil.disarm();

    let evil_handle: StrategyHandle = evil.clone();
    let honest: StrategyHandle = Arc::new(deployment.strategy("honest"));
    deployment.install(&[evil_handle.clone(), honest]).unwrap();
    deployment.fund(ALICE, 1_000).unwrap();
    (deployment, evil, evil_handle)
}

#[test]
fn reentrant_deposit_during_skim_is_declined() {
    let (deployment, evil, _) = deploy_with_attacker();
    deployment.token.mint(deployment.vault.id(), 100).unwrap();
    evil.rearm();

    assert_eq!(deployment.vault.skim().unwrap(), 100);

    assert_eq!(evil.last_reentry(), Some(Err::<Amount, _>(CascadeError::Reentrancy)));
    assert_eq!(held(&deployment, "evil"), 0);
    assert_eq!(held(&deployment, "honest"), 100);
}

#[test]
fn reentrant_withdrawal_aborts_rebalance() {
    let (deployment, evil, evil_handle) = deploy_with_attacker();
    deployment.vault.deposit(&alice(), 500, &alice()).unwrap();
    assert_eq!(held(&deployment, "evil"), 500);
    let before = fingerprint(&deployment, &WATCHED);

    evil.rearm();
    assert_eq!(
        deployment
            .vault
            .rebalance(&acct(KEEPER), &evil_handle, &acct("honest"), 100, 0),
        Err(CascadeError::Reentrancy)
    );

    assert_eq!(fingerprint(&deployment, &WATCHED), before);
    // The guard was released on the way out.
    assert_eq!(deployment.vault.skim(), Ok(0));
}

#[test]
fn reentrant_withdrawal_aborts_removal() {
    let (deployment, evil, _) = deploy_with_attacker();
    deployment.vault.deposit(&alice(), 500, &alice()).unwrap();
    let before = fingerprint(&deployment, &WATCHED);

    evil.rearm();
    assert_eq!(
        deployment
            .vault
            .remove_strategies(&acct(ADMIN), &[acct("evil")], &acct("honest")),
        Err(CascadeError::Reentrancy)
    );
    assert_eq!(fingerprint(&deployment, &WATCHED), before);
}

#[test]
fn nested_deposit_during_rebalance_is_rejected() {
    let (deployment, evil, evil_handle) = deploy_with_reentry(Reentry::Deposit {
        caller: acct(BOB),
        assets: 50,
    });
    deployment.fund(BOB, 200).unwrap();
    deployment.vault.deposit(&alice(), 500, &alice()).unwrap();

    let watched = ["alice", "bob", "evil", "honest", "cascade-vault"];
    let before = fingerprint(&deployment, &watched);

    // `evil` is the source, so the deposit fires from inside its withdraw.
    evil.rearm();
    assert_eq!(
        deployment
            .vault
            .rebalance(&acct(KEEPER), &evil_handle, &acct("honest"), 100, 0),
        Err(CascadeError::Reentrancy)
    );

    assert_eq!(evil.last_reentry(), Some(Err::<Amount, _>(CascadeError::Reentrancy)));
    assert_eq!(fingerprint(&deployment, &watched), before);
    assert_eq!(deployment.vault.balance_of(&acct(BOB)), 0);

    // Outside a guarded operation the same deposit goes through.
    assert_eq!(deployment.vault.deposit(&acct(BOB), 50, &acct(BOB)), Ok(50));
}

#[test]
fn concurrent_guarded_calls_queue_instead_of_failing() {
    let (deployment, strategies) = deploy(&[None, None], 1_000);
    deployment.vault.deposit(&alice(), 500, &alice()).unwrap();
    strategies[0].update(|p| p.withdraw_delay = Some(Duration::from_millis(300)));
    deployment.token.mint(deployment.vault.id(), 100).unwrap();

    let source: StrategyHandle = strategies[0].clone();
    let vault = &deployment.vault;
    let (rebalanced, skimmed) = thread::scope(|scope| {
        let keeper =
            scope.spawn(|| vault.rebalance(&acct(KEEPER), &source, &acct("s1"), 200, 0));
        let sweeper = scope.spawn(|| {
            // Lands while the rebalance sits in the slow withdrawal.
            thread::sleep(Duration::from_millis(100));
            vault.skim()
        });
        (keeper.join().unwrap(), sweeper.join().unwrap())
    });

    assert_eq!(rebalanced, Ok(200));
    assert_eq!(skimmed, Ok(100));
    assert_eq!(held(&deployment, "s0"), 400);
    assert_eq!(held(&deployment, "s1"), 200);
    assert_eq!(deployment.vault.total_assets().unwrap(), 600);
}
