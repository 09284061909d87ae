//! In-memory `EventSink`.
//!
//! `InMemoryEventLog` appends every committed vault notification to a
//! SHA-256 hash chain. A clone shares the same chain, so a test or the demo
//! can keep one handle while the vault holds another.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use cascade_contracts::{
    account::AccountId,
    error::{CascadeError, CascadeResult},
    event::{CallId, EventRecord, VaultEvent},
};
use cascade_core::traits::EventSink;

use crate::{
    chain::{hash_event, verify_chain},
    event::{EventLog, LoggedEvent},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct ChainState {
    pub(crate) events: Vec<LoggedEvent>,
    pub(crate) sequence: u64,
    pub(crate) last_hash: String,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// Append-only, hash-chained log of one vault's committed notifications.
#[derive(Clone)]
pub struct InMemoryEventLog {
    vault: AccountId,
    pub(crate) state: Arc<Mutex<ChainState>>,
}

impl InMemoryEventLog {
    /// An empty log for `vault`.
    ///
    /// Records emitted for any other vault are refused.
    pub fn new(vault: impl Into<AccountId>) -> Self {
        Self {
            vault: vault.into(),
            state: Arc::new(Mutex::new(ChainState {
                events: Vec::new(),
                sequence: 0,
                last_hash: LoggedEvent::GENESIS_HASH.to_string(),
            })),
        }
    }

    fn lock(&self) -> CascadeResult<MutexGuard<'_, ChainState>> {
        self.state.lock().map_err(|e| CascadeError::EventWriteFailed {
            reason: format!("event log lock poisoned: {}", e),
        })
    }

    /// Number of entries written.
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The notifications written so far, in order, without chain metadata.
    pub fn events(&self) -> Vec<VaultEvent> {
        self.lock()
            .map(|state| state.events.iter().map(|e| e.record.event.clone()).collect())
            .unwrap_or_default()
    }

    /// Notifications committed by one top-level call.
    pub fn events_for(&self, call_id: CallId) -> Vec<VaultEvent> {
        self.lock()
            .map(|state| {
                state
                    .events
                    .iter()
                    .filter(|e| e.record.call_id == call_id)
                    .map(|e| e.record.event.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Export every entry written so far.
    pub fn export_log(&self) -> CascadeResult<EventLog> {
        let state = self.lock()?;
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        Ok(EventLog {
            vault: self.vault.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        })
    }

    /// Return true if the chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        self.lock()
            .map(|state| verify_chain(&state.events))
            .unwrap_or(false)
    }
}

// ── EventSink impl ────────────────────────────────────────────────────────────

impl EventSink for InMemoryEventLog {
    fn emit_batch(&self, records: &[EventRecord]) -> CascadeResult<()> {
        if let Some(foreign) = records.iter().find(|r| r.vault != self.vault) {
            return Err(CascadeError::EventWriteFailed {
                reason: format!(
                    "log for vault '{}' refused a record from '{}'",
                    self.vault, foreign.vault
                ),
            });
        }

        let mut state = self.lock()?;

        // Hash the whole batch before touching the chain.
        let mut staged = Vec::with_capacity(records.len());
        let mut prev_hash = state.last_hash.clone();
        let mut sequence = state.sequence;
        for record in records {
            let this_hash = hash_event(&self.vault, sequence, record, &prev_hash)?;
            staged.push(LoggedEvent {
                sequence,
                record: record.clone(),
                prev_hash,
                this_hash: this_hash.clone(),
            });
            prev_hash = this_hash;
            sequence += 1;
        }

        debug!(
            vault = %self.vault,
            first = state.sequence,
            count = staged.len(),
            "events appended"
        );

        state.events.extend(staged);
        state.sequence = sequence;
        state.last_hash = prev_hash;
        Ok(())
    }
}
