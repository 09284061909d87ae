//! Execution serialization and reentrancy protection.
//!
//! `ExecutionLane` gives each vault one-operation-at-a-time semantics:
//! top-level calls from different threads queue behind each other, while a
//! nested call made from inside a running operation (on the same thread, for
//! example a strategy calling back into the vault) is let through.
//!
//! `ReentrancyGuard` is taken inside the lane by the operations that measure
//! balance deltas after an outbound call. While it is held, a nested call
//! into any vault entry point is rejected, so two threads running guarded
//! operations queue on the lane instead of failing on the guard.
//!
//! Both hand out RAII tokens that release on drop, so every exit path,
//! including `?`, releases the lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use cascade_contracts::error::{CascadeError, CascadeResult};

#[derive(Debug, Default)]
struct LaneState {
    holder: Option<ThreadId>,
    depth: usize,
}

/// Serializes top-level operations on one vault.
#[derive(Debug, Default)]
pub struct ExecutionLane {
    state: Mutex<LaneState>,
    released: Condvar,
}

/// Proof of being inside the lane. Dropping it leaves.
#[derive(Debug)]
pub struct LaneTicket<'a> {
    lane: &'a ExecutionLane,
    outermost: bool,
}

impl ExecutionLane {
    /// Create an empty lane.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the lane, blocking while another thread holds it.
    pub fn enter(&self) -> CascadeResult<LaneTicket<'_>> {
        let me = thread::current().id();
        let mut state = self.state.lock().map_err(|e| CascadeError::LockPoisoned {
            reason: format!("execution lane: {e}"),
        })?;

        loop {
            match state.holder {
                None => {
                    state.holder = Some(me);
                    state.depth = 1;
                    return Ok(LaneTicket {
                        lane: self,
                        outermost: true,
                    });
                }
                Some(holder) if holder == me => {
                    state.depth += 1;
                    return Ok(LaneTicket {
                        lane: self,
                        outermost: false,
                    });
                }
                Some(_) => {
                    state = self.released.wait(state).map_err(|e| CascadeError::LockPoisoned {
                        reason: format!("execution lane: {e}"),
                    })?;
                }
            }
        }
    }

    /// Current nesting depth (0 when idle).
    pub fn depth(&self) -> usize {
        self.lock_state().depth
    }

    fn lock_state(&self) -> MutexGuard<'_, LaneState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl LaneTicket<'_> {
    /// True for the top-level operation, false for a nested one.
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for LaneTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.lane.lock_state();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.holder = None;
            self.lane.released.notify_one();
        }
    }
}

/// Mutual-exclusion flag for operations that must not be re-entered.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    locked: AtomicBool,
}

/// Held while a guarded operation runs. Dropping it unlocks the guard.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    /// Create an unlocked guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the guard, failing immediately with `Reentrancy` if it is held.
    pub fn enter(&self) -> CascadeResult<GuardToken<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CascadeError::Reentrancy)?;
        Ok(GuardToken { guard: self })
    }

    /// Return true while a guarded operation is running.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.locked.store(false, Ordering::Release);
    }
}
