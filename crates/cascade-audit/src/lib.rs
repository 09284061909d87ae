//! # cascade-audit
//!
//! Append-only, SHA-256 hash-chained log of committed vault notifications.
//!
//! Every record the vault flushes on commit is wrapped in a `LoggedEvent`
//! that links to the previous entry by hash. Altering any entry breaks the
//! chain and is caught by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cascade_audit::InMemoryEventLog;
//!
//! let log = InMemoryEventLog::new("vault");
//! // Pass `Arc::new(log.clone())` to the vault as its `EventSink`.
//! assert!(log.verify_integrity());
//! let exported = log.export_log()?;
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{EventLog, LoggedEvent};
pub use memory::InMemoryEventLog;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use cascade_contracts::{
        account::AccountId,
        error::CascadeError,
        event::{CallId, EventRecord, VaultEvent},
    };
    use cascade_core::traits::EventSink;

    use super::{verify_chain, InMemoryEventLog, LoggedEvent};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn skimmed(call_id: CallId, amount: u128) -> EventRecord {
        EventRecord {
            call_id,
            vault: AccountId::new("vault"),
            event: VaultEvent::Skimmed { amount },
            timestamp: Utc::now(),
        }
    }

    fn filled_log(n: u128) -> InMemoryEventLog {
        let log = InMemoryEventLog::new("vault");
        let call = CallId::new();
        for i in 0..n {
            log.emit(&skimmed(call, i + 1)).unwrap();
        }
        log
    }

    // ── 1. empty log ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_log_is_valid() {
        let log = InMemoryEventLog::new("vault");
        assert!(log.is_empty());
        assert!(log.verify_integrity());
        assert_eq!(log.export_log().unwrap().terminal_hash, "");
    }

    // ── 2. linkage ────────────────────────────────────────────────────────────

    #[test]
    fn test_entries_are_linked() {
        let log = filled_log(3);
        let exported = log.export_log().unwrap();

        assert_eq!(exported.events.len(), 3);
        assert_eq!(exported.events[0].prev_hash, LoggedEvent::GENESIS_HASH);
        assert_eq!(exported.events[1].prev_hash, exported.events[0].this_hash);
        assert_eq!(exported.events[2].prev_hash, exported.events[1].this_hash);
        assert_eq!(exported.terminal_hash, exported.events[2].this_hash);
        assert!(log.verify_integrity());
    }

    // ── 3. tamper detection ───────────────────────────────────────────────────

    #[test]
    fn test_modified_record_breaks_chain() {
        let log = filled_log(3);
        {
            let mut state = log.state.lock().unwrap();
            state.events[1].record.event = VaultEvent::Skimmed { amount: 999 };
        }
        assert!(!log.verify_integrity());
    }

    #[test]
    fn test_dropped_entry_breaks_chain() {
        let mut events = filled_log(3).export_log().unwrap().events;
        events.remove(1);
        assert!(!verify_chain(&events));
    }

    // ── 4. call grouping ──────────────────────────────────────────────────────

    #[test]
    fn test_events_grouped_by_call() {
        let log = InMemoryEventLog::new("vault");
        let first = CallId::new();
        let second = CallId::new();
        log.emit(&skimmed(first, 1)).unwrap();
        log.emit(&skimmed(second, 2)).unwrap();
        log.emit(&skimmed(first, 3)).unwrap();

        assert_eq!(
            log.events_for(first),
            vec![VaultEvent::Skimmed { amount: 1 }, VaultEvent::Skimmed { amount: 3 }]
        );
        assert_eq!(log.events().len(), 3);
    }

    // ── 5. foreign vault ──────────────────────────────────────────────────────

    #[test]
    fn test_record_from_other_vault_is_refused() {
        let log = InMemoryEventLog::new("vault");
        let mut record = skimmed(CallId::new(), 1);
        record.vault = AccountId::new("other");

        match log.emit(&record) {
            Err(CascadeError::EventWriteFailed { reason }) => assert!(reason.contains("other")),
            other => panic!("expected EventWriteFailed, got {:?}", other),
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_large_amounts_hash() {
        let log = InMemoryEventLog::new("vault");
        log.emit(&skimmed(CallId::new(), u128::MAX)).unwrap();
        assert!(log.verify_integrity());
    }

    // ── 6. batches ────────────────────────────────────────────────────────────

    #[test]
    fn test_batch_appends_in_order() {
        let log = filled_log(2);
        let call = CallId::new();
        let batch = vec![skimmed(call, 10), skimmed(call, 20), skimmed(call, 30)];
        log.emit_batch(&batch).unwrap();

        assert_eq!(log.len(), 5);
        assert_eq!(log.events_for(call).len(), 3);
        let exported = log.export_log().unwrap();
        let sequences: Vec<u64> = exported.events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_batch_with_foreign_record_writes_nothing() {
        let log = filled_log(2);
        let terminal = log.export_log().unwrap().terminal_hash;

        let call = CallId::new();
        let mut foreign = skimmed(call, 20);
        foreign.vault = AccountId::new("other");
        let batch = vec![skimmed(call, 10), foreign, skimmed(call, 30)];

        match log.emit_batch(&batch) {
            Err(CascadeError::EventWriteFailed { reason }) => assert!(reason.contains("other")),
            other => panic!("expected EventWriteFailed, got {:?}", other),
        }
        assert_eq!(log.len(), 2);
        assert!(log.events_for(call).is_empty());
        assert_eq!(log.export_log().unwrap().terminal_hash, terminal);

        // The chain continues from where it was.
        log.emit(&skimmed(CallId::new(), 3)).unwrap();
        assert_eq!(log.len(), 3);
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let log = filled_log(1);
        log.emit_batch(&[]).unwrap();
        assert_eq!(log.len(), 1);
        assert!(log.verify_integrity());
    }
}
