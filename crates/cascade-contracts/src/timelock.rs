//! Timelock record types.
//!
//! Each guarded administrative operation has its own record. The gate that
//! drives these records lives in `cascade-core::timelock`; this module only
//! defines their shape so that events and errors can refer to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a timelock-guarded administrative operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationId {
    AddStrategies,
    RemoveStrategies,
    SetPerformanceFee,
}

impl OperationId {
    /// Every guarded operation, in a fixed order.
    pub const ALL: [OperationId; 3] = [
        OperationId::AddStrategies,
        OperationId::RemoveStrategies,
        OperationId::SetPerformanceFee,
    ];

    /// Stable kebab-case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationId::AddStrategies => "add-strategies",
            OperationId::RemoveStrategies => "remove-strategies",
            OperationId::SetPerformanceFee => "set-performance-fee",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation timelock state.
///
/// `armed_at == None` is the Idle state. Once armed, the operation is Ready
/// when `duration_secs` have elapsed since `armed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockRecord {
    /// When the first guarded call was recorded, if one is pending.
    pub armed_at: Option<DateTime<Utc>>,
    /// Required delay between arming and execution, in seconds.
    pub duration_secs: u64,
}

impl TimelockRecord {
    /// An idle record with the given delay.
    pub fn idle(duration_secs: u64) -> Self {
        Self {
            armed_at: None,
            duration_secs,
        }
    }
}

/// What a timelock-guarded entry point did on this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminOutcome {
    /// The operation ran and its state change is committed.
    Executed,

    /// This call armed the timelock. Nothing else changed; call again once
    /// `ready_at` has passed.
    Armed { ready_at: DateTime<Utc> },

    /// The timelock is armed but not yet ready. Nothing changed.
    Pending { ready_at: DateTime<Utc> },
}

impl AdminOutcome {
    /// Return true if the guarded state change was applied.
    pub fn executed(&self) -> bool {
        matches!(self, AdminOutcome::Executed)
    }
}

/// Delays configured at vault initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockDurations {
    pub add_strategies_secs: u64,
    pub remove_strategies_secs: u64,
    pub performance_fee_secs: u64,
}

impl TimelockDurations {
    /// The configured delay for `operation`.
    pub fn for_operation(&self, operation: OperationId) -> u64 {
        match operation {
            OperationId::AddStrategies => self.add_strategies_secs,
            OperationId::RemoveStrategies => self.remove_strategies_secs,
            OperationId::SetPerformanceFee => self.performance_fee_secs,
        }
    }
}

impl Default for TimelockDurations {
    fn default() -> Self {
        Self {
            add_strategies_secs: crate::DEFAULT_ADD_STRATEGIES_DELAY_SECS,
            remove_strategies_secs: crate::DEFAULT_REMOVE_STRATEGIES_DELAY_SECS,
            performance_fee_secs: crate::DEFAULT_PERFORMANCE_FEE_DELAY_SECS,
        }
    }
}
