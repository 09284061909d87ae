//! # cascade-core
//!
//! The allocation engine of the Cascade multi-strategy vault.
//!
//! This crate provides:
//! - The collaborator traits (`Strategy`, `AssetToken`, `ShareAccounting`,
//!   `AccessGate`, `EventSink`, `Clock`, `Journaled`)
//! - `StrategyRegistry`, the ordered, bounded strategy list
//! - The deposit and withdrawal waterfalls and aggregate capacity views
//! - `TimelockGate`, `ReentrancyGuard`, and `ExecutionLane`
//! - `MultiStrategyVault`, which wires them together behind atomic
//!   all-or-nothing entry points
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cascade_core::{MultiStrategyVault, VaultConfig, VaultParts};
//!
//! let vault = MultiStrategyVault::new(config, parts)?;
//! vault.add_strategies(&manager, &[strategy_a, strategy_b])?;
//! let shares = vault.deposit(&alice, 1_000, &alice)?;
//! ```

pub mod admin;
pub mod allocation;
pub mod clock;
pub mod guard;
pub mod rebalance;
pub mod registry;
pub mod timelock;
pub mod traits;
pub mod vault;

pub use allocation::{AllocationLeg, AllocationReport, SubCallOutcome};
pub use clock::{ManualClock, SystemClock};
pub use registry::{Binding, StrategyRegistry};
pub use timelock::{GateDecision, TimelockGate};
pub use traits::{
    AccessGate, AssetToken, Clock, EventSink, Journaled, ShareAccounting, Snapshot, Strategy,
    StrategyHandle,
};
pub use vault::{MultiStrategyVault, VaultConfig, VaultParts};
