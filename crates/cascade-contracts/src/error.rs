//! Error types for the Cascade vault.
//!
//! All fallible operations in the workspace return `CascadeResult<T>`. Every
//! error is fatal to the enclosing top-level vault operation, which is rolled
//! back in full. Variants carry the amounts needed to tell which strategies
//! under-delivered.

use thiserror::Error;

use crate::{
    account::{AccountId, Amount},
    role::Role,
    timelock::OperationId,
};

/// The unified error type for the Cascade workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// A strategy handle resolved to the null account.
    #[error("strategy reference is null")]
    NullReference,

    /// The strategy is already registered, is not registered when it must be,
    /// or is bound to a different asset or authority than the vault.
    #[error("strategy '{strategy}' is a duplicate or invalid for this vault")]
    DuplicateOrInvalidStrategy { strategy: AccountId },

    /// The strategy named as a destination is not a registered member.
    #[error("strategy '{strategy}' is not a registered strategy")]
    InvalidStrategy { strategy: AccountId },

    /// The strategy list is already at its fixed maximum length.
    #[error("strategy list is full (maximum {max})")]
    CapacityExceeded { max: usize },

    /// A reorder request does not have the same length as the current list.
    #[error("reorder list has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A positive amount was required.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// The deposit waterfall exhausted the strategy list with assets left over.
    #[error("could not allocate {remaining} of {requested} assets ({shares} shares)")]
    AllocationShortfall {
        requested: Amount,
        shares: Amount,
        remaining: Amount,
    },

    /// The withdrawal waterfall exhausted the strategy list short of the target.
    #[error("could not withdraw {remaining} of {requested} assets ({shares} shares)")]
    WithdrawalShortfall {
        requested: Amount,
        shares: Amount,
        remaining: Amount,
    },

    /// A rebalance delivered less to the destination than the caller accepts.
    #[error("rebalance delivered {actual}, below the minimum of {min_amount}")]
    BelowMinimumTransfer { actual: Amount, min_amount: Amount },

    /// The caller does not hold the role the entry point requires.
    #[error("account '{account}' lacks role '{role}'")]
    Unauthorized { account: AccountId, role: Role },

    /// A guarded operation was entered while another guarded operation on the
    /// same vault was still running.
    #[error("reentrant call rejected")]
    Reentrancy,

    /// A request exceeds the maximum the vault currently accepts.
    #[error("{action} of {requested} exceeds the maximum of {max}")]
    LimitExceeded {
        action: String,
        requested: Amount,
        max: Amount,
    },

    /// A token or share transfer exceeds the sender's balance.
    #[error("account '{account}' holds {available}, needs {needed}")]
    InsufficientBalance {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// A delegated transfer exceeds the granted allowance.
    #[error("allowance from '{owner}' to '{spender}' is {available}, needs {needed}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// A performance fee outside the permitted range.
    #[error("performance fee of {bps} bps exceeds the maximum of {max_bps} bps")]
    InvalidFee { bps: u32, max_bps: u32 },

    /// An attempt to shorten a timelock duration that is fixed at initialization.
    #[error("timelock for '{operation}' cannot be set below {minimum_secs}s")]
    TimelockDurationLocked {
        operation: OperationId,
        minimum_secs: u64,
    },

    /// A strategy refused or failed a sub-call.
    ///
    /// Inside a waterfall this is caught and treated as "declined"; it only
    /// reaches the caller from direct calls such as `rebalance`.
    #[error("strategy '{strategy}' failed: {reason}")]
    StrategyFailure { strategy: AccountId, reason: String },

    /// Checked arithmetic overflowed or underflowed.
    #[error("arithmetic error: {reason}")]
    Arithmetic { reason: String },

    /// State could not be captured or restored for rollback.
    #[error("snapshot failed: {reason}")]
    SnapshotFailed { reason: String },

    /// The event sink could not persist a notification.
    #[error("event write failed: {reason}")]
    EventWriteFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// An internal lock was poisoned by a panicking thread.
    #[error("lock poisoned: {reason}")]
    LockPoisoned { reason: String },
}

impl CascadeError {
    /// Shorthand for an overflow in a named computation.
    pub fn overflow(what: &str) -> Self {
        CascadeError::Arithmetic {
            reason: format!("overflow in {what}"),
        }
    }
}

/// Convenience alias used throughout the Cascade crates.
pub type CascadeResult<T> = Result<T, CascadeError>;
