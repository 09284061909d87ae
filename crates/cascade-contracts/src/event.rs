//! Vault notifications and their committed records.
//!
//! `VaultEvent` is what an operation announces. `EventRecord` is what the
//! event sink receives once the outermost operation commits. A rolled-back
//! operation produces no records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    account::{AccountId, Amount},
    timelock::OperationId,
};

/// Identifier shared by every record a single top-level operation emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub uuid::Uuid);

impl CallId {
    /// Create a new, unique call ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

/// A notification raised by a vault operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaultEvent {
    /// A strategy joined the list at `position`.
    StrategyAdded { strategy: AccountId, position: usize },

    /// A strategy left the list; later entries shifted left.
    StrategyRemoved { strategy: AccountId },

    /// Capital moved directly between two strategies.
    Rebalanced {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },

    /// Assets entered the vault and shares were minted.
    Deposited {
        caller: AccountId,
        receiver: AccountId,
        assets: Amount,
        shares: Amount,
    },

    /// Shares were burned and assets left the vault.
    Withdrawn {
        caller: AccountId,
        receiver: AccountId,
        owner: AccountId,
        assets: Amount,
        shares: Amount,
    },

    /// Idle vault balance was swept into the strategies.
    Skimmed { amount: Amount },

    /// A guarded operation was armed and may execute from `ready_at`.
    TimelockArmed {
        operation: OperationId,
        ready_at: DateTime<Utc>,
    },

    /// The delay for a guarded operation changed.
    TimelockDurationSet {
        operation: OperationId,
        duration_secs: u64,
    },

    /// The performance fee changed.
    PerformanceFeeSet { fee_bps: u32 },

    /// The fee recipient changed.
    FeeRecipientSet { recipient: AccountId },
}

/// A committed notification, as written to the event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The top-level operation that produced this event.
    pub call_id: CallId,
    /// The vault that emitted it.
    pub vault: AccountId,
    /// The notification itself.
    pub event: VaultEvent,
    /// Vault clock time at emission (UTC).
    pub timestamp: DateTime<Utc>,
}
