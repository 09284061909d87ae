//! Tokenized-share ledger with a performance fee and an optional supply cap.
//!
//! Conversions use a virtual offset of one share and one asset, so the first
//! depositor gets shares 1:1 and donations cannot inflate the share price
//! against later depositors. Fees are taken as newly minted shares: when the
//! vault has grown since the last checkpoint, the fee recipient receives
//! enough shares to be worth `performance_fee_bps` of the growth.
//!
//! Every conversion first folds in the fee shares that *would* be minted at
//! the supplied `total_assets`, so a preview taken before `accrue_fees`
//! matches the amount the vault actually mints after it.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::{debug, info};

use cascade_contracts::{
    account::{AccountId, Amount, Rounding},
    error::{CascadeError, CascadeResult},
    BPS_DENOMINATOR, MAX_PERFORMANCE_FEE_BPS,
};
use cascade_core::traits::{Journaled, ShareAccounting, Snapshot};

use crate::{lock, math::mul_div};

#[derive(Debug, Clone)]
struct LedgerState {
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    total_supply: Amount,
    last_total_assets: Amount,
    performance_fee_bps: u32,
    fee_recipient: AccountId,
    supply_cap: Option<Amount>,
}

impl LedgerState {
    fn balance(&self, owner: &AccountId) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Fee shares owed at `total_assets`, not yet minted.
    fn pending_fee_shares(&self, total_assets: Amount) -> CascadeResult<Amount> {
        if self.performance_fee_bps == 0
            || self.total_supply == 0
            || total_assets <= self.last_total_assets
        {
            return Ok(0);
        }

        let profit = total_assets - self.last_total_assets;
        let fee_assets = mul_div(
            profit,
            Amount::from(self.performance_fee_bps),
            Amount::from(BPS_DENOMINATOR),
            Rounding::Down,
        )?;
        if fee_assets == 0 {
            return Ok(0);
        }

        // Price the fee against the assets that remain for existing holders.
        mul_div(
            fee_assets,
            self.total_supply.saturating_add(1),
            (total_assets - fee_assets).saturating_add(1),
            Rounding::Down,
        )
    }

    fn effective_supply(&self, total_assets: Amount) -> CascadeResult<Amount> {
        Ok(self
            .total_supply
            .saturating_add(self.pending_fee_shares(total_assets)?))
    }

    fn credit(&mut self, to: &AccountId, shares: Amount) -> CascadeResult<()> {
        let balance = self
            .balance(to)
            .checked_add(shares)
            .ok_or_else(|| CascadeError::overflow("share balance"))?;
        let supply = self
            .total_supply
            .checked_add(shares)
            .ok_or_else(|| CascadeError::overflow("share supply"))?;
        self.balances.insert(to.clone(), balance);
        self.total_supply = supply;
        Ok(())
    }
}

fn check_fee(fee_bps: u32) -> CascadeResult<()> {
    if fee_bps > MAX_PERFORMANCE_FEE_BPS {
        return Err(CascadeError::InvalidFee {
            bps: fee_bps,
            max_bps: MAX_PERFORMANCE_FEE_BPS,
        });
    }
    Ok(())
}

/// The vault's own share ledger.
#[derive(Debug)]
pub struct ShareLedger {
    state: Mutex<LedgerState>,
}

impl ShareLedger {
    /// A ledger with no shares outstanding.
    ///
    /// Fails with `InvalidFee` if `performance_fee_bps` exceeds
    /// `MAX_PERFORMANCE_FEE_BPS`, or `NullReference` if a non-zero fee has no
    /// recipient.
    pub fn new(fee_recipient: AccountId, performance_fee_bps: u32) -> CascadeResult<Self> {
        check_fee(performance_fee_bps)?;
        if performance_fee_bps > 0 && fee_recipient.is_null() {
            return Err(CascadeError::NullReference);
        }
        Ok(Self {
            state: Mutex::new(LedgerState {
                balances: BTreeMap::new(),
                allowances: BTreeMap::new(),
                total_supply: 0,
                last_total_assets: 0,
                performance_fee_bps,
                fee_recipient,
                supply_cap: None,
            }),
        })
    }

    /// Cap total shares outstanding at `cap`.
    pub fn with_supply_cap(self, cap: Amount) -> Self {
        lock(&self.state).supply_cap = Some(cap);
        self
    }

    /// Configured supply cap, if any.
    pub fn supply_cap(&self) -> Option<Amount> {
        lock(&self.state).supply_cap
    }

    /// Total assets recorded at the last fee checkpoint.
    pub fn last_total_assets(&self) -> Amount {
        lock(&self.state).last_total_assets
    }

    /// Current share allowance from `owner` to `spender`.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        lock(&self.state).allowance(owner, spender)
    }
}

impl Journaled for ShareLedger {
    fn snapshot(&self) -> CascadeResult<Snapshot> {
        Ok(Snapshot::new(lock(&self.state).clone()))
    }

    fn restore(&self, snapshot: &Snapshot) -> CascadeResult<()> {
        let saved = snapshot.downcast::<LedgerState>()?;
        *lock(&self.state) = saved.clone();
        Ok(())
    }
}

impl ShareAccounting for ShareLedger {
    fn total_supply(&self) -> Amount {
        lock(&self.state).total_supply
    }

    fn balance_of(&self, owner: &AccountId) -> Amount {
        lock(&self.state).balance(owner)
    }

    fn convert_to_shares(
        &self,
        assets: Amount,
        total_assets: Amount,
        rounding: Rounding,
    ) -> CascadeResult<Amount> {
        let state = lock(&self.state);
        let supply = state.effective_supply(total_assets)?;
        mul_div(
            assets,
            supply.saturating_add(1),
            total_assets.saturating_add(1),
            rounding,
        )
    }

    fn convert_to_assets(
        &self,
        shares: Amount,
        total_assets: Amount,
        rounding: Rounding,
    ) -> CascadeResult<Amount> {
        let state = lock(&self.state);
        let supply = state.effective_supply(total_assets)?;
        mul_div(
            shares,
            total_assets.saturating_add(1),
            supply.saturating_add(1),
            rounding,
        )
    }

    fn max_deposit_limit(
        &self,
        _receiver: &AccountId,
        total_assets: Amount,
    ) -> CascadeResult<Amount> {
        let state = lock(&self.state);
        let Some(cap) = state.supply_cap else {
            return Ok(Amount::MAX);
        };
        let supply = state.effective_supply(total_assets)?;
        let headroom = cap.saturating_sub(supply);
        if headroom == 0 {
            return Ok(0);
        }
        mul_div(
            headroom,
            total_assets.saturating_add(1),
            supply.saturating_add(1),
            Rounding::Down,
        )
    }

    fn mint(&self, to: &AccountId, shares: Amount) -> CascadeResult<()> {
        if to.is_null() {
            return Err(CascadeError::NullReference);
        }
        lock(&self.state).credit(to, shares)
    }

    fn burn(&self, from: &AccountId, shares: Amount) -> CascadeResult<()> {
        let mut state = lock(&self.state);
        let available = state.balance(from);
        if available < shares {
            return Err(CascadeError::InsufficientBalance {
                account: from.clone(),
                needed: shares,
                available,
            });
        }
        state.balances.insert(from.clone(), available - shares);
        state.total_supply -= shares;
        Ok(())
    }

    fn approve(&self, owner: &AccountId, spender: &AccountId, shares: Amount) -> CascadeResult<()> {
        if owner.is_null() || spender.is_null() {
            return Err(CascadeError::NullReference);
        }
        let mut state = lock(&self.state);
        let by_spender = state.allowances.entry(owner.clone()).or_default();
        if shares == 0 {
            by_spender.remove(spender);
        } else {
            by_spender.insert(spender.clone(), shares);
        }
        Ok(())
    }

    fn spend_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        shares: Amount,
    ) -> CascadeResult<()> {
        let mut state = lock(&self.state);
        let allowed = state.allowance(owner, spender);
        if allowed == Amount::MAX {
            return Ok(());
        }
        if allowed < shares {
            return Err(CascadeError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                needed: shares,
                available: allowed,
            });
        }
        let by_spender = state.allowances.entry(owner.clone()).or_default();
        let left = allowed - shares;
        if left == 0 {
            by_spender.remove(spender);
        } else {
            by_spender.insert(spender.clone(), left);
        }
        Ok(())
    }

    fn accrue_fees(&self, total_assets: Amount) -> CascadeResult<Amount> {
        let mut state = lock(&self.state);
        let fee_shares = state.pending_fee_shares(total_assets)?;
        if fee_shares > 0 {
            let recipient = state.fee_recipient.clone();
            state.credit(&recipient, fee_shares)?;
            info!(
                recipient = %recipient,
                fee_shares,
                total_assets,
                last_total_assets = state.last_total_assets,
                "performance fee accrued"
            );
        }
        state.last_total_assets = total_assets;
        Ok(fee_shares)
    }

    fn checkpoint_assets(&self, total_assets: Amount) -> CascadeResult<()> {
        lock(&self.state).last_total_assets = total_assets;
        Ok(())
    }

    fn performance_fee_bps(&self) -> u32 {
        lock(&self.state).performance_fee_bps
    }

    fn set_performance_fee_bps(&self, fee_bps: u32) -> CascadeResult<()> {
        check_fee(fee_bps)?;
        let mut state = lock(&self.state);
        if fee_bps > 0 && state.fee_recipient.is_null() {
            return Err(CascadeError::NullReference);
        }
        debug!(from = state.performance_fee_bps, to = fee_bps, "performance fee changed");
        state.performance_fee_bps = fee_bps;
        Ok(())
    }

    fn fee_recipient(&self) -> AccountId {
        lock(&self.state).fee_recipient.clone()
    }

    fn set_fee_recipient(&self, recipient: AccountId) -> CascadeResult<()> {
        if recipient.is_null() {
            return Err(CascadeError::NullReference);
        }
        lock(&self.state).fee_recipient = recipient;
        Ok(())
    }
}
