//! Hash-chain primitives.
//!
//! Hash input layout (bytes, in order):
//!   1. vault id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the event record

use sha2::{Digest, Sha256};

use cascade_contracts::{
    account::AccountId,
    error::{CascadeError, CascadeResult},
    event::EventRecord,
};

use crate::event::LoggedEvent;

/// Compute the SHA-256 hash for one logged event.
///
/// Returns a lowercase 64-character hex string, or `EventWriteFailed` if the
/// record cannot be encoded.
pub fn hash_event(
    vault: &AccountId,
    sequence: u64,
    record: &EventRecord,
    prev_hash: &str,
) -> CascadeResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| CascadeError::EventWriteFailed {
        reason: format!("event record is not encodable: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(vault.as_str().as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify prev-hash linkage and hash correctness for a whole chain.
///
/// An empty chain is valid. Sequence numbers must start at zero and
/// increase by one.
pub fn verify_chain(events: &[LoggedEvent]) -> bool {
    let mut expected_prev = LoggedEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return false;
        }

        match hash_event(&event.record.vault, event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
