//! # cascade-accounting
//!
//! Concrete ledgers behind the vault's `AssetToken` and `ShareAccounting`
//! seams:
//!
//! - `InMemoryToken`: the underlying asset, with balances and allowances
//! - `ShareLedger`:   vault shares, conversion math, performance fee, supply cap
//!
//! Both are `Journaled`: their whole state is cloned into a snapshot and put
//! back on rollback.

pub mod math;
pub mod shares;
pub mod token;

use std::sync::{Mutex, MutexGuard};

pub use shares::ShareLedger;
pub use token::InMemoryToken;

/// Lock a ledger's state.
///
/// Ledger mutations never panic part-way, so a poisoned lock still guards
/// consistent state and is recovered rather than reported.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
