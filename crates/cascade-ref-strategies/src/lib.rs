//! # cascade-ref-strategies
//!
//! Reference runtime for the Cascade multi-strategy vault.
//!
//! - `CappedStrategy`:    a configurable strategy with a cap, a liquidity
//!   limit, a withdrawal haircut, and switchable failures
//! - `ReentrantStrategy`: calls back into the vault mid-operation
//! - `Deployment`:        the reference vault, wired from TOML settings
//! - `scenarios`:         runnable walk-throughs used by the demo binary
//!
//! All balances live in memory. Nothing leaves the process.

pub mod capped;
pub mod deployment;
pub mod reentrant;
pub mod scenarios;

pub use capped::{CappedStrategy, StrategyProfile};
pub use deployment::Deployment;
pub use reentrant::ReentrantStrategy;
