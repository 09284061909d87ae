//! Scenario: deposit and withdrawal waterfalls.
//!
//! Three strategies in priority order: one capped at 50, one capped at 100,
//! one unbounded. A 120 deposit fills the first, puts the rest in the second,
//! and never reaches the third. A 70 withdrawal drains the first and takes
//! the remainder from the second. A donation left idle in the vault is then
//! swept in with `skim`.

use std::sync::Arc;

use cascade_contracts::error::CascadeResult;
use cascade_core::traits::StrategyHandle;

use crate::{
    deployment::{acct, Deployment, ALICE},
    scenarios::{finish, print_allocation},
};

pub fn run_scenario() -> CascadeResult<()> {
    println!("=== Scenario: Deposit & Withdrawal Waterfall ===");
    println!();

    let deployment = Deployment::reference()?;
    let strategies: [StrategyHandle; 3] = [
        Arc::new(deployment.strategy("conservative").with_cap(50)),
        Arc::new(deployment.strategy("balanced").with_cap(100)),
        Arc::new(deployment.strategy("aggressive")),
    ];
    deployment.install(&strategies)?;

    deployment.fund(ALICE, 1_000)?;
    let alice = acct(ALICE);

    println!("  Step 1: alice deposits 120");
    let shares = deployment.vault.deposit(&alice, 120, &alice)?;
    println!("    minted {shares} shares");
    print_allocation(&deployment)?;
    println!();

    println!("  Step 2: alice withdraws 70");
    let burned = deployment.vault.withdraw(&alice, 70, &alice, &alice)?;
    println!("    burned {burned} shares");
    print_allocation(&deployment)?;
    println!();

    println!("  Step 3: 30 is donated to the vault and skimmed");
    deployment.token.mint(deployment.vault.id(), 30)?;
    let skimmed = deployment.vault.skim()?;
    println!("    skimmed {skimmed}");
    print_allocation(&deployment)?;
    println!();

    println!(
        "  Capacity now: max_deposit = {}, max_withdraw(alice) = {}",
        deployment.vault.max_deposit(&alice)?,
        deployment.vault.max_withdraw(&alice)?
    );

    finish(&deployment)
}
