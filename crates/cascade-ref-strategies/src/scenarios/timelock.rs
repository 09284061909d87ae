//! Scenario: timelocked administration.
//!
//! The manager's first `add_strategies` call only arms the timer; a second
//! call a day later is still pending; after the two-day delay the third call
//! executes. The fee manager goes through the same dance for a fee change
//! with its seven-day delay, and the admin then finds that delay cannot be
//! shortened.

use std::sync::Arc;

use cascade_contracts::{error::CascadeResult, timelock::OperationId};
use cascade_core::traits::{ShareAccounting, StrategyHandle};

use crate::{
    deployment::{acct, Deployment, ADMIN, MANAGER, TREASURER},
    scenarios::finish,
};

const DAY_SECS: i64 = 24 * 60 * 60;

pub fn run_scenario() -> CascadeResult<()> {
    println!("=== Scenario: Timelocked Administration ===");
    println!();

    let deployment = Deployment::reference()?;
    let manager = acct(MANAGER);
    let treasurer = acct(TREASURER);
    let admin = acct(ADMIN);
    let strategy: StrategyHandle = Arc::new(deployment.strategy("newcomer"));

    println!("  Step 1: manager adds a strategy (day 0)");
    let outcome = deployment.vault.add_strategies(&manager, &[strategy.clone()])?;
    println!("    {:?}; registered = {}", outcome, deployment.vault.strategies_count()?);

    deployment.clock.advance_secs(DAY_SECS);
    println!("  Step 2: manager retries (day 1)");
    let outcome = deployment.vault.add_strategies(&manager, &[strategy.clone()])?;
    println!("    {:?}; registered = {}", outcome, deployment.vault.strategies_count()?);

    deployment.clock.advance_secs(DAY_SECS);
    println!("  Step 3: manager retries (day 2)");
    let outcome = deployment.vault.add_strategies(&manager, &[strategy])?;
    println!("    {:?}; registered = {}", outcome, deployment.vault.strategies_count()?);
    println!();

    println!("  Step 4: treasurer raises the performance fee to 20%");
    let outcome = deployment.vault.set_performance_fee_percent(&treasurer, 2_000)?;
    println!("    {:?}; fee = {} bps", outcome, deployment.shares.performance_fee_bps());

    deployment.clock.advance_secs(7 * DAY_SECS);
    let outcome = deployment.vault.set_performance_fee_percent(&treasurer, 2_000)?;
    println!(
        "    after 7 days: {:?}; fee = {} bps",
        outcome,
        deployment.shares.performance_fee_bps()
    );
    println!();

    println!("  Step 5: admin tries to cut the fee delay to one hour");
    match deployment
        .vault
        .set_timelock_duration(&admin, OperationId::SetPerformanceFee, 3_600)
    {
        Ok(()) => println!("    unexpectedly accepted"),
        Err(err) => println!("    refused: {err}"),
    }

    finish(&deployment)
}
