//! Deposit and withdrawal waterfalls, and the aggregate capacity views.
//!
//! Both waterfalls walk the registry in priority order and stop at the
//! first strategy with no room (deposit) or nothing available (withdraw);
//! they never skip past an exhausted strategy to reach lower-priority ones.
//! A strategy whose sub-call fails is rolled back to its state before the
//! call and counted as having contributed nothing. Only an overall shortfall
//! aborts the enclosing operation.

use tracing::{debug, warn};

use cascade_contracts::{
    account::{AccountId, Amount},
    error::{CascadeError, CascadeResult},
};

use crate::{traits::StrategyHandle, vault::MultiStrategyVault};

/// What one strategy did within a waterfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubCallOutcome {
    /// The call succeeded. For withdrawals `delivered` is the measured
    /// balance change, not the requested chunk.
    Filled { delivered: Amount },
    /// The call failed and its effects were undone.
    Declined { reason: String },
}

/// One strategy's part in a waterfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationLeg {
    pub strategy: AccountId,
    pub requested: Amount,
    pub outcome: SubCallOutcome,
}

/// The legs of a completed waterfall, in the order they were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationReport {
    pub legs: Vec<AllocationLeg>,
}

impl AllocationReport {
    /// Sum delivered across filled legs.
    pub fn delivered(&self) -> Amount {
        self.legs
            .iter()
            .map(|leg| match leg.outcome {
                SubCallOutcome::Filled { delivered } => delivered,
                SubCallOutcome::Declined { .. } => 0,
            })
            .fold(0, Amount::saturating_add)
    }

    /// Number of strategies that declined.
    pub fn declined(&self) -> usize {
        self.legs
            .iter()
            .filter(|leg| matches!(leg.outcome, SubCallOutcome::Declined { .. }))
            .count()
    }
}

impl MultiStrategyVault {
    /// Sum of `total_assets()` across registered strategies.
    pub fn total_managed_assets(&self) -> CascadeResult<Amount> {
        Ok(self
            .registered()?
            .iter()
            .map(|s| s.total_assets())
            .fold(0, Amount::saturating_add))
    }

    /// Sum of every strategy's deposit room. Saturates instead of wrapping
    /// when a strategy reports an unbounded maximum.
    pub fn aggregate_max_deposit(&self) -> CascadeResult<Amount> {
        Ok(self
            .registered()?
            .iter()
            .map(|s| s.max_deposit(&self.id))
            .fold(0, Amount::saturating_add))
    }

    /// Sum of what every strategy could release to the vault. Saturating.
    pub fn aggregate_max_withdraw(&self) -> CascadeResult<Amount> {
        Ok(self
            .registered()?
            .iter()
            .map(|s| s.max_withdraw(&self.id))
            .fold(0, Amount::saturating_add))
    }

    /// Place `assets` (booked as `shares`) into the strategies.
    pub(crate) fn deposit_waterfall(
        &self,
        assets: Amount,
        shares: Amount,
    ) -> CascadeResult<AllocationReport> {
        let mut remaining = assets;
        let mut report = AllocationReport::default();

        for strategy in self.registered()? {
            let strategy_id = strategy.id();
            let room = strategy.max_deposit(&self.id);
            let chunk = remaining.min(room);
            if chunk == 0 {
                debug!(
                    strategy = %strategy_id,
                    remaining,
                    "waterfall stopped at strategy without room"
                );
                break;
            }

            self.token.approve(&self.id, &strategy_id, chunk)?;
            let outcome = self.isolated(&strategy, || strategy.deposit(&self.id, chunk, &self.id))?;

            let outcome = match outcome {
                Ok(_) => {
                    remaining -= chunk;
                    debug!(strategy = %strategy_id, chunk, remaining, "strategy accepted deposit");
                    SubCallOutcome::Filled { delivered: chunk }
                }
                Err(err) => {
                    self.token.approve(&self.id, &strategy_id, 0)?;
                    warn!(
                        strategy = %strategy_id,
                        chunk,
                        error = %err,
                        "strategy declined deposit"
                    );
                    SubCallOutcome::Declined {
                        reason: err.to_string(),
                    }
                }
            };
            report.legs.push(AllocationLeg {
                strategy: strategy_id,
                requested: chunk,
                outcome,
            });
        }

        if remaining > 0 {
            return Err(CascadeError::AllocationShortfall {
                requested: assets,
                shares,
                remaining,
            });
        }
        Ok(report)
    }

    /// Pull `assets` (backing `shares`) out of the strategies into the vault.
    pub(crate) fn withdraw_waterfall(
        &self,
        assets: Amount,
        shares: Amount,
    ) -> CascadeResult<AllocationReport> {
        let mut remaining = assets;
        let mut report = AllocationReport::default();

        for strategy in self.registered()? {
            let strategy_id = strategy.id();
            let available = strategy.max_withdraw(&self.id);
            let chunk = remaining.min(available);
            if chunk == 0 {
                debug!(
                    strategy = %strategy_id,
                    remaining,
                    "waterfall stopped at strategy without liquidity"
                );
                break;
            }

            let before = self.token.balance_of(&self.id);
            let outcome = self.isolated(&strategy, || {
                strategy.withdraw(&self.id, chunk, &self.id, &self.id)
            })?;

            let outcome = match outcome {
                Ok(_) => {
                    let delivered = self.token.balance_of(&self.id).saturating_sub(before);
                    remaining = remaining.saturating_sub(delivered);
                    if delivered < chunk {
                        debug!(
                            strategy = %strategy_id,
                            chunk,
                            delivered,
                            "strategy under-delivered"
                        );
                    }
                    SubCallOutcome::Filled { delivered }
                }
                Err(err) => {
                    warn!(
                        strategy = %strategy_id,
                        chunk,
                        error = %err,
                        "strategy declined withdrawal"
                    );
                    SubCallOutcome::Declined {
                        reason: err.to_string(),
                    }
                }
            };
            report.legs.push(AllocationLeg {
                strategy: strategy_id,
                requested: chunk,
                outcome,
            });
        }

        if remaining > 0 {
            return Err(CascadeError::WithdrawalShortfall {
                requested: assets,
                shares,
                remaining,
            });
        }
        Ok(report)
    }

    /// Run one strategy sub-call with its own checkpoint.
    ///
    /// The outer `Result` is fatal (the checkpoint itself failed); the inner
    /// one is the sub-call's outcome, already rolled back on `Err`.
    fn isolated<T>(
        &self,
        strategy: &StrategyHandle,
        call: impl FnOnce() -> CascadeResult<T>,
    ) -> CascadeResult<Result<T, CascadeError>> {
        let checkpoint = self.checkpoint(std::slice::from_ref(strategy))?;
        match call() {
            Ok(value) => Ok(Ok(value)),
            Err(err) => {
                self.rollback(checkpoint)?;
                Ok(Err(err))
            }
        }
    }

    /// Registered handles, cloned so no lock is held across strategy calls.
    pub(crate) fn registered(&self) -> CascadeResult<Vec<StrategyHandle>> {
        Ok(self.state()?.registry.handles())
    }
}
