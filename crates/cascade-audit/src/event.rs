//! Logged event and exported log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cascade_contracts::{account::AccountId, event::EventRecord};

/// One entry in a vault's hash chain.
///
/// Changing any field, including those of the embedded `record`,
/// invalidates `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    /// The committed notification.
    pub record: EventRecord,

    /// Hash of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Hash over (vault, sequence, prev_hash, record).
    pub this_hash: String,
}

impl LoggedEvent {
    /// `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A point-in-time export of one vault's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    pub vault: AccountId,

    /// Entries in chain order.
    pub events: Vec<LoggedEvent>,

    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last entry. Empty if the log is empty.
    pub terminal_hash: String,
}
