//! Demo scenarios.
//!
//! Each scenario deploys the reference vault, drives it through one family
//! of operations, prints what happened, and checks the event log's hash
//! chain at the end.

pub mod rebalance;
pub mod timelock;
pub mod waterfall;

use cascade_contracts::error::{CascadeError, CascadeResult};
use cascade_core::traits::AssetToken;

use crate::deployment::Deployment;

/// Print each registered strategy's holdings in priority order.
pub(crate) fn print_allocation(deployment: &Deployment) -> CascadeResult<()> {
    for (position, id) in deployment.vault.strategies()?.iter().enumerate() {
        println!(
            "    [{position}] {:<12} holds {:>6}",
            id.as_str(),
            deployment.token.balance_of(id)
        );
    }
    println!(
        "    idle in vault     {:>6}",
        deployment.vault.idle_assets()
    );
    Ok(())
}

/// Print the log summary and fail if the hash chain does not verify.
pub(crate) fn finish(deployment: &Deployment) -> CascadeResult<()> {
    let exported = deployment.log.export_log()?;
    println!();
    println!("  Event log: {} entries", exported.events.len());
    for entry in &exported.events {
        println!("    #{:<3} {:?}", entry.sequence, entry.record.event);
    }
    let intact = deployment.log.verify_integrity();
    println!("  Hash chain intact: {intact}");
    println!();
    if !intact {
        return Err(CascadeError::EventWriteFailed {
            reason: "event log hash chain failed verification".to_string(),
        });
    }
    Ok(())
}
