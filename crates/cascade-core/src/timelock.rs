//! Per-operation delay gate.
//!
//! Each guarded operation moves through Idle → Armed → Ready → Idle. Waiting
//! happens between calls, never inside one: the first call arms the gate and
//! returns, and only a later call made after the delay proceeds.
//!
//! The performance-fee delay is fixed at construction: `set_duration` may
//! lengthen it but never take it below its initial value.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use cascade_contracts::{
    error::{CascadeError, CascadeResult},
    timelock::{OperationId, TimelockDurations, TimelockRecord},
};

/// What the gate says about the current invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the operation now.
    Proceed,
    /// This call armed the gate; do nothing else.
    Armed { ready_at: DateTime<Utc> },
    /// Still waiting; do nothing else.
    Pending { ready_at: DateTime<Utc> },
}

/// Keyed timelock state machine.
#[derive(Debug, Clone)]
pub struct TimelockGate {
    records: BTreeMap<OperationId, TimelockRecord>,
    fee_floor_secs: u64,
}

impl TimelockGate {
    /// Build an idle gate for every guarded operation.
    pub fn new(durations: &TimelockDurations) -> Self {
        let records = OperationId::ALL
            .iter()
            .map(|op| (*op, TimelockRecord::idle(durations.for_operation(*op))))
            .collect();
        Self {
            records,
            fee_floor_secs: durations.performance_fee_secs,
        }
    }

    /// Current record for `operation`.
    pub fn record(&self, operation: OperationId) -> TimelockRecord {
        self.records
            .get(&operation)
            .cloned()
            .unwrap_or_else(|| TimelockRecord::idle(0))
    }

    /// Ask whether `operation` may run at `now`.
    ///
    /// With `bypass` set (top administrative role) the gate is skipped and
    /// its record left untouched.
    pub fn check(
        &mut self,
        operation: OperationId,
        now: DateTime<Utc>,
        bypass: bool,
    ) -> GateDecision {
        if bypass {
            debug!(operation = %operation, "timelock bypassed by top role");
            return GateDecision::Proceed;
        }

        let record = self
            .records
            .entry(operation)
            .or_insert_with(|| TimelockRecord::idle(0));

        match record.armed_at {
            None => {
                record.armed_at = Some(now);
                let ready_at = ready_at(now, record.duration_secs);
                debug!(operation = %operation, %ready_at, "timelock armed");
                GateDecision::Armed { ready_at }
            }
            Some(armed_at) => {
                let ready_at = ready_at(armed_at, record.duration_secs);
                if now < ready_at {
                    GateDecision::Pending { ready_at }
                } else {
                    record.armed_at = None;
                    debug!(operation = %operation, "timelock elapsed, proceeding");
                    GateDecision::Proceed
                }
            }
        }
    }

    /// Change the delay for `operation`.
    ///
    /// A pending arming keeps its original `armed_at` and is measured against
    /// the new delay.
    pub fn set_duration(
        &mut self,
        operation: OperationId,
        duration_secs: u64,
    ) -> CascadeResult<()> {
        if operation == OperationId::SetPerformanceFee && duration_secs < self.fee_floor_secs {
            return Err(CascadeError::TimelockDurationLocked {
                operation,
                minimum_secs: self.fee_floor_secs,
            });
        }
        self.records
            .entry(operation)
            .or_insert_with(|| TimelockRecord::idle(duration_secs))
            .duration_secs = duration_secs;
        Ok(())
    }
}

/// `armed_at + duration_secs`, saturating at the far future.
fn ready_at(armed_at: DateTime<Utc>, duration_secs: u64) -> DateTime<Utc> {
    i64::try_from(duration_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delay| armed_at.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
