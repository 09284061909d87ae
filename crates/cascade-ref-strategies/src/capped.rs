//! A configurable single-asset strategy.
//!
//! `CappedStrategy` issues its own internal shares against the tokens it
//! holds, so tokens minted straight into its account read as yield and raise
//! every holder's `max_withdraw`. Its behaviour can be bent to exercise the
//! vault's failure paths:
//!
//! - a deposit cap (`max_deposit` shrinks to zero as it fills)
//! - a liquidity limit (`max_withdraw` never exceeds it)
//! - a withdrawal haircut (delivers less than asked, like a lossy exit)
//! - outright failure of deposits or withdrawals, while still advertising
//!   capacity the way a broken strategy would
//! - a withdrawal delay, to hold a vault operation open for concurrency tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::debug;

use cascade_accounting::math::mul_div;
use cascade_contracts::{
    account::{AccountId, Amount, AssetId, Rounding},
    error::{CascadeError, CascadeResult},
    BPS_DENOMINATOR,
};
use cascade_core::traits::{AssetToken, Journaled, Snapshot, Strategy};

/// Knobs that change how a `CappedStrategy` behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyProfile {
    /// Most assets the strategy will hold. `None` is unbounded.
    pub cap: Option<Amount>,
    /// Most assets that can leave per call. `None` is unbounded.
    pub liquidity: Option<Amount>,
    /// Share of every withdrawal kept back, in basis points.
    pub withdraw_haircut_bps: u32,
    pub fail_deposits: bool,
    pub fail_withdrawals: bool,
    /// Time every withdrawal spends before touching the book.
    pub withdraw_delay: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
struct PositionBook {
    shares: BTreeMap<AccountId, Amount>,
    total_shares: Amount,
    profile: StrategyProfile,
}

/// Reference `Strategy` backed by the vault's own token ledger.
pub struct CappedStrategy {
    id: AccountId,
    asset: AssetId,
    authority: AccountId,
    token: Arc<dyn AssetToken>,
    book: Mutex<PositionBook>,
}

impl CappedStrategy {
    /// An unbounded, well-behaved strategy.
    pub fn new(
        id: impl Into<AccountId>,
        authority: AccountId,
        token: Arc<dyn AssetToken>,
    ) -> Self {
        Self {
            id: id.into(),
            asset: token.asset(),
            authority,
            token,
            book: Mutex::new(PositionBook::default()),
        }
    }

    /// Override the reported asset, e.g. to build a mismatched strategy.
    pub fn with_asset(mut self, asset: AssetId) -> Self {
        self.asset = asset;
        self
    }

    pub fn with_profile(self, profile: StrategyProfile) -> Self {
        self.update(|p| *p = profile);
        self
    }

    pub fn with_cap(self, cap: Amount) -> Self {
        self.update(|p| p.cap = Some(cap));
        self
    }

    pub fn with_liquidity(self, liquidity: Amount) -> Self {
        self.update(|p| p.liquidity = Some(liquidity));
        self
    }

    pub fn with_withdraw_haircut_bps(self, bps: u32) -> Self {
        self.update(|p| p.withdraw_haircut_bps = bps.min(BPS_DENOMINATOR));
        self
    }

    /// Change the behaviour of a live strategy.
    pub fn update(&self, change: impl FnOnce(&mut StrategyProfile)) {
        change(&mut self.book().profile);
    }

    pub fn profile(&self) -> StrategyProfile {
        self.book().profile.clone()
    }

    /// Internal shares held by `owner`.
    pub fn shares_of(&self, owner: &AccountId) -> Amount {
        self.book().shares.get(owner).copied().unwrap_or(0)
    }

    fn book(&self) -> std::sync::MutexGuard<'_, PositionBook> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failure(&self, reason: impl Into<String>) -> CascadeError {
        CascadeError::StrategyFailure {
            strategy: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn assets_of(&self, book: &PositionBook, owner: &AccountId) -> CascadeResult<Amount> {
        let shares = book.shares.get(owner).copied().unwrap_or(0);
        if shares == 0 {
            return Ok(0);
        }
        mul_div(shares, self.total_assets(), book.total_shares, Rounding::Down)
    }
}

impl Journaled for CappedStrategy {
    fn snapshot(&self) -> CascadeResult<Snapshot> {
        Ok(Snapshot::new(self.book().clone()))
    }

    fn restore(&self, snapshot: &Snapshot) -> CascadeResult<()> {
        let saved = snapshot.downcast::<PositionBook>()?;
        *self.book() = saved.clone();
        Ok(())
    }
}

impl Strategy for CappedStrategy {
    fn id(&self) -> AccountId {
        self.id.clone()
    }

    fn underlying_asset(&self) -> AssetId {
        self.asset.clone()
    }

    fn authority(&self) -> AccountId {
        self.authority.clone()
    }

    fn total_assets(&self) -> Amount {
        self.token.balance_of(&self.id)
    }

    fn max_deposit(&self, _receiver: &AccountId) -> Amount {
        match self.book().profile.cap {
            Some(cap) => cap.saturating_sub(self.total_assets()),
            None => Amount::MAX,
        }
    }

    fn max_withdraw(&self, owner: &AccountId) -> Amount {
        let book = self.book();
        let owned = self.assets_of(&book, owner).unwrap_or(0);
        match book.profile.liquidity {
            Some(liquidity) => owned.min(liquidity),
            None => owned,
        }
    }

    fn deposit(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
    ) -> CascadeResult<Amount> {
        let mut book = self.book();
        if book.profile.fail_deposits {
            return Err(self.failure("deposits are disabled"));
        }
        let held = self.total_assets();
        if let Some(cap) = book.profile.cap {
            if held.saturating_add(assets) > cap {
                return Err(self.failure(format!("deposit of {assets} exceeds cap {cap}")));
            }
        }
        if assets == 0 {
            return Ok(0);
        }

        let shares = if book.total_shares == 0 || held == 0 {
            assets
        } else {
            mul_div(assets, book.total_shares, held, Rounding::Down)?
        };
        self.token.transfer_from(&self.id, caller, &self.id, assets)?;

        let balance = book.shares.entry(receiver.clone()).or_insert(0);
        *balance = balance
            .checked_add(shares)
            .ok_or_else(|| CascadeError::overflow("strategy shares"))?;
        book.total_shares = book
            .total_shares
            .checked_add(shares)
            .ok_or_else(|| CascadeError::overflow("strategy shares"))?;

        debug!(strategy = %self.id, assets, shares, "strategy deposit");
        Ok(shares)
    }

    fn withdraw(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> CascadeResult<Amount> {
        if caller != owner {
            return Err(self.failure("only the owner may withdraw"));
        }
        let delay = self.book().profile.withdraw_delay;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        let mut book = self.book();
        if book.profile.fail_withdrawals {
            return Err(self.failure("withdrawals are disabled"));
        }
        let owned = self.assets_of(&book, owner)?;
        let limit = book.profile.liquidity.map_or(owned, |l| owned.min(l));
        if assets > limit {
            return Err(self.failure(format!("withdrawal of {assets} exceeds available {limit}")));
        }
        if assets == 0 {
            return Ok(0);
        }

        let held = self.total_assets();
        let owner_shares = book.shares.get(owner).copied().unwrap_or(0);
        let shares = mul_div(assets, book.total_shares, held, Rounding::Up)?.min(owner_shares);

        let kept = mul_div(
            assets,
            Amount::from(book.profile.withdraw_haircut_bps),
            Amount::from(BPS_DENOMINATOR),
            Rounding::Down,
        )?;
        self.token.transfer(&self.id, receiver, assets - kept)?;

        book.shares.insert(owner.clone(), owner_shares - shares);
        book.total_shares -= shares;

        debug!(
            strategy = %self.id,
            assets,
            delivered = assets - kept,
            shares,
            "strategy withdrawal"
        );
        Ok(shares)
    }
}
