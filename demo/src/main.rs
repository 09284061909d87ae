//! Cascade multi-strategy vault: demo CLI
//!
//! Runs one or all of the reference scenarios against an in-memory vault
//! deployment, or prints what a settings file would deploy.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- waterfall
//!   cargo run -p demo -- rebalance
//!   cargo run -p demo -- timelock
//!   cargo run -p demo -- inspect path/to/vault.toml

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cascade_contracts::error::CascadeResult;
use cascade_policy::VaultSettings;
use cascade_ref_strategies::scenarios::{rebalance, timelock, waterfall};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Cascade: a vault that spreads one asset over an ordered list of strategies.
///
/// Each subcommand runs one or all of the reference scenarios, showing the
/// allocation waterfalls, keeper rebalancing, and timelocked administration.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Cascade multi-strategy vault reference demo",
    long_about = "Runs Cascade vault scenarios showing deposit and withdrawal waterfalls,\n\
                  rebalancing, timelocked administration, and event log integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: deposits and withdrawals cascading over capped strategies.
    Waterfall,
    /// Scenario 2: keeper rebalancing with a minimum-received bound.
    Rebalance,
    /// Scenario 3: arming and executing timelocked administration.
    Timelock,
    /// Validate a vault settings file and print what it deploys.
    Inspect {
        /// Path to a vault settings TOML file.
        settings: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug to see every waterfall step.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Waterfall => waterfall::run_scenario(),
        Command::Rebalance => rebalance::run_scenario(),
        Command::Timelock => timelock::run_scenario(),
        Command::Inspect { settings } => inspect(&settings),
    };

    match result {
        Ok(()) => {
            println!("Done.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

fn run_all() -> CascadeResult<()> {
    waterfall::run_scenario()?;
    rebalance::run_scenario()?;
    timelock::run_scenario()?;
    Ok(())
}

fn inspect(path: &Path) -> CascadeResult<()> {
    let settings = VaultSettings::from_file(path)?;
    info!(path = %path.display(), vault = %settings.vault.id, "settings loaded");

    println!("Vault       {}", settings.vault.id);
    println!("Asset       {}", settings.vault.asset);
    println!("Authority   {}", settings.vault.authority);
    println!();
    println!("Timelocks");
    println!("  add strategies     {:>8}s", settings.timelocks.add_strategies_secs);
    println!("  remove strategies  {:>8}s", settings.timelocks.remove_strategies_secs);
    println!("  performance fee    {:>8}s", settings.timelocks.performance_fee_secs);
    println!();
    println!("Fees");
    println!("  performance fee    {:>5} bps", settings.fees.performance_fee_bps);
    println!("  recipient          {}", settings.fee_recipient());
    match settings.fees.supply_cap {
        Some(cap) => println!("  supply cap         {}", cap),
        None => println!("  supply cap         none"),
    }
    println!();
    println!("Grants");
    for grant in &settings.grants {
        let accounts: Vec<&str> = grant.accounts.iter().map(|a| a.as_str()).collect();
        println!("  {:<14} {}", grant.role.as_str(), accounts.join(", "));
    }
    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Cascade Multi-Strategy Vault");
    println!("Reference Demo");
    println!("============================");
    println!();
    println!("Every vault entry point runs as one atomic step:");
    println!("  [1] Reentrancy guard and access role are checked");
    println!("  [2] Vault, token, shares and strategies are checkpointed");
    println!("  [3] Deposits fill strategies in priority order until one has no room");
    println!("  [4] Withdrawals drain strategies in priority order until one has no liquidity");
    println!("  [5] On success, events are appended to the SHA-256 chained log;");
    println!("      on failure, every checkpoint is restored and nothing is emitted");
    println!();
}
