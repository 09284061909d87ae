//! # cascade-contracts
//!
//! Shared types, events, and error contracts for the Cascade multi-strategy
//! vault.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod account;
pub mod error;
pub mod event;
pub mod role;
pub mod timelock;

/// Maximum number of strategies a vault may hold at once.
pub const MAX_STRATEGIES: usize = 10;

/// Default delay before `add_strategies` may execute: 2 days.
pub const DEFAULT_ADD_STRATEGIES_DELAY_SECS: u64 = 2 * 24 * 60 * 60;

/// Default delay before `remove_strategies` may execute: 1 day.
pub const DEFAULT_REMOVE_STRATEGIES_DELAY_SECS: u64 = 24 * 60 * 60;

/// Default delay before a performance fee change may execute: 7 days.
pub const DEFAULT_PERFORMANCE_FEE_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

/// Denominator for basis-point quantities.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Highest performance fee the accounting layer accepts.
pub const MAX_PERFORMANCE_FEE_BPS: u32 = 5_000;
