//! A hostile strategy that calls back into the vault mid-operation.
//!
//! On its first deposit or withdrawal `ReentrantStrategy` calls back into
//! the vault that is calling it (`skim` by default, or a `deposit` on behalf
//! of some account), then carries on as the wrapped `CappedStrategy` would.
//! If the callback fails, the strategy fails with the same error. The attack
//! fires once; `rearm` fires it again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use tracing::warn;

use cascade_contracts::{
    account::{AccountId, Amount, AssetId},
    error::CascadeResult,
};
use cascade_core::{
    traits::{Journaled, Snapshot, Strategy},
    vault::MultiStrategyVault,
};

use crate::capped::CappedStrategy;

/// The vault entry point a `ReentrantStrategy` calls back into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reentry {
    Skim,
    /// `caller` deposits `assets` for itself; the caller needs a token
    /// balance and an allowance for the vault.
    Deposit { caller: AccountId, assets: Amount },
}

pub struct ReentrantStrategy {
    inner: CappedStrategy,
    reentry: Reentry,
    vault: OnceLock<Weak<MultiStrategyVault>>,
    armed: AtomicBool,
    last_reentry: Mutex<Option<CascadeResult<Amount>>>,
}

impl ReentrantStrategy {
    pub fn new(inner: CappedStrategy) -> Self {
        Self {
            inner,
            reentry: Reentry::Skim,
            vault: OnceLock::new(),
            armed: AtomicBool::new(true),
            last_reentry: Mutex::new(None),
        }
    }

    pub fn with_reentry(mut self, reentry: Reentry) -> Self {
        self.reentry = reentry;
        self
    }

    /// Point the attack at `vault`. Only the first call has any effect.
    pub fn target(&self, vault: &Arc<MultiStrategyVault>) {
        let _ = self.vault.set(Arc::downgrade(vault));
    }

    pub fn rearm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// What the most recent callback returned, if one has fired.
    pub fn last_reentry(&self) -> Option<CascadeResult<Amount>> {
        self.last_reentry
            .lock()
            .map(|outcome| outcome.clone())
            .unwrap_or(None)
    }

    fn reenter(&self) -> CascadeResult<()> {
        if !self.armed.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let Some(vault) = self.vault.get().and_then(Weak::upgrade) else {
            return Ok(());
        };

        warn!(
            strategy = %self.inner.id(),
            vault = %vault.id(),
            reentry = ?self.reentry,
            "re-entering vault"
        );
        let outcome = match &self.reentry {
            Reentry::Skim => vault.skim(),
            Reentry::Deposit { caller, assets } => vault.deposit(caller, *assets, caller),
        };
        if let Ok(mut last) = self.last_reentry.lock() {
            *last = Some(outcome.clone());
        }
        outcome.map(|_| ())
    }
}

impl Journaled for ReentrantStrategy {
    fn snapshot(&self) -> CascadeResult<Snapshot> {
        self.inner.snapshot()
    }

    fn restore(&self, snapshot: &Snapshot) -> CascadeResult<()> {
        self.inner.restore(snapshot)
    }
}

impl Strategy for ReentrantStrategy {
    fn id(&self) -> AccountId {
        self.inner.id()
    }

    fn underlying_asset(&self) -> AssetId {
        self.inner.underlying_asset()
    }

    fn authority(&self) -> AccountId {
        self.inner.authority()
    }

    fn total_assets(&self) -> Amount {
        self.inner.total_assets()
    }

    fn max_deposit(&self, receiver: &AccountId) -> Amount {
        self.inner.max_deposit(receiver)
    }

    fn max_withdraw(&self, owner: &AccountId) -> Amount {
        self.inner.max_withdraw(owner)
    }

    fn deposit(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
    ) -> CascadeResult<Amount> {
        self.reenter()?;
        self.inner.deposit(caller, assets, receiver)
    }

    fn withdraw(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> CascadeResult<Amount> {
        self.reenter()?;
        self.inner.withdraw(caller, assets, receiver, owner)
    }
}
