//! Scenario: direct rebalancing between strategies.
//!
//! 1 000 is deposited into the first of two strategies. The keeper moves
//! 400 to the second. A second move out of a strategy that now keeps back
//! 10% of every exit is refused because it lands below the keeper's
//! minimum, and the vault is left exactly as before. A caller without the
//! rebalancer role is refused outright.

use std::sync::Arc;

use cascade_contracts::error::CascadeResult;
use cascade_core::traits::StrategyHandle;

use crate::{
    capped::CappedStrategy,
    deployment::{acct, Deployment, ALICE, KEEPER},
    scenarios::{finish, print_allocation},
};

pub fn run_scenario() -> CascadeResult<()> {
    println!("=== Scenario: Rebalance ===");
    println!();

    let deployment = Deployment::reference()?;
    let primary: Arc<CappedStrategy> = Arc::new(deployment.strategy("primary"));
    let secondary: Arc<CappedStrategy> = Arc::new(deployment.strategy("secondary"));
    let primary_handle: StrategyHandle = primary.clone();
    let secondary_handle: StrategyHandle = secondary;
    deployment.install(&[primary_handle.clone(), secondary_handle])?;

    deployment.fund(ALICE, 1_000)?;
    let alice = acct(ALICE);
    let keeper = acct(KEEPER);
    deployment.vault.deposit(&alice, 1_000, &alice)?;
    println!("  After deposit:");
    print_allocation(&deployment)?;
    println!();

    println!("  Step 1: keeper moves 400 primary -> secondary (min 400)");
    let moved = deployment
        .vault
        .rebalance(&keeper, &primary_handle, &acct("secondary"), 400, 400)?;
    println!("    moved {moved}");
    print_allocation(&deployment)?;
    println!();

    println!("  Step 2: primary now keeps 10% of exits; keeper asks for 100 (min 100)");
    primary.update(|profile| profile.withdraw_haircut_bps = 1_000);
    match deployment
        .vault
        .rebalance(&keeper, &primary_handle, &acct("secondary"), 100, 100)
    {
        Ok(moved) => println!("    unexpectedly moved {moved}"),
        Err(err) => println!("    refused: {err}"),
    }
    print_allocation(&deployment)?;
    println!();

    println!("  Step 3: alice tries to rebalance");
    match deployment
        .vault
        .rebalance(&alice, &primary_handle, &acct("secondary"), 1, 0)
    {
        Ok(moved) => println!("    unexpectedly moved {moved}"),
        Err(err) => println!("    refused: {err}"),
    }

    finish(&deployment)
}
