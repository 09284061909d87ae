//! Direct capital moves between two strategies.
//!
//! The source is not required to be registered, so a strategy that was
//! removed while still holding a residual balance can be drained. This also
//! means any component satisfying `Strategy` can be named as the source; the
//! rebalancer role is the only check on that trust boundary.

use tracing::info;

use cascade_contracts::{
    account::{AccountId, Amount},
    error::{CascadeError, CascadeResult},
    event::VaultEvent,
    role::Role,
};

use crate::{traits::StrategyHandle, vault::MultiStrategyVault};

impl MultiStrategyVault {
    /// Move `amount` out of `from` and into the registered strategy `to`.
    ///
    /// The amount deposited into `to` is whatever actually arrived from
    /// `from`. Fails with `BelowMinimumTransfer` if `to`'s total assets grew
    /// by less than `min_amount`. Returns the amount moved.
    pub fn rebalance(
        &self,
        caller: &AccountId,
        from: &StrategyHandle,
        to: &AccountId,
        amount: Amount,
        min_amount: Amount,
    ) -> CascadeResult<Amount> {
        self.transact_guarded("rebalance", std::slice::from_ref(from), || {
            self.require_role(Role::Rebalancer, caller)?;

            let destination = self
                .state()?
                .registry
                .get(to)
                .cloned()
                .ok_or_else(|| CascadeError::InvalidStrategy { strategy: to.clone() })?;
            if amount == 0 {
                return Err(CascadeError::ZeroAmount);
            }

            let destination_before = destination.total_assets();
            let moved = self.pull_from(from, amount)?;

            self.token.approve(&self.id, to, moved)?;
            destination.deposit(&self.id, moved, &self.id)?;

            let actual = destination.total_assets().saturating_sub(destination_before);
            if actual < min_amount {
                return Err(CascadeError::BelowMinimumTransfer { actual, min_amount });
            }

            info!(
                vault = %self.id,
                from = %from.id(),
                to = %to,
                requested = amount,
                moved,
                landed = actual,
                "rebalance executed"
            );
            self.record(VaultEvent::Rebalanced {
                from: from.id(),
                to: to.clone(),
                amount: moved,
            })?;
            Ok(moved)
        })
    }

    /// Withdraw `amount` from `strategy` into the vault and return the
    /// balance change actually observed.
    pub(crate) fn pull_from(
        &self,
        strategy: &StrategyHandle,
        amount: Amount,
    ) -> CascadeResult<Amount> {
        let before = self.token.balance_of(&self.id);
        strategy.withdraw(&self.id, amount, &self.id, &self.id)?;
        Ok(self.token.balance_of(&self.id).saturating_sub(before))
    }
}
