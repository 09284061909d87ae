//! Administrative entry points: strategy list changes, skim, timelock
//! durations, and fee settings.
//!
//! Strategy additions, strategy removals, and performance fee changes are
//! timelock-guarded: they return `AdminOutcome::Armed` or
//! `AdminOutcome::Pending` without changing anything until the delay for
//! that operation has passed, unless the caller holds the top role.

use tracing::info;

use cascade_contracts::{
    account::{AccountId, Amount},
    error::{CascadeError, CascadeResult},
    event::VaultEvent,
    role::Role,
    timelock::{AdminOutcome, OperationId},
    MAX_PERFORMANCE_FEE_BPS,
};

use crate::{traits::StrategyHandle, vault::MultiStrategyVault};

impl MultiStrategyVault {
    /// Append `strategies` to the list, lowest priority last.
    ///
    /// Each one is validated as it is added; any failure rejects the whole
    /// batch.
    pub fn add_strategies(
        &self,
        caller: &AccountId,
        strategies: &[StrategyHandle],
    ) -> CascadeResult<AdminOutcome> {
        self.transact("add_strategies", &[], || {
            self.require_role(Role::VaultManager, caller)?;
            if let Some(outcome) = self.timelocked(OperationId::AddStrategies, caller)? {
                return Ok(outcome);
            }

            let now = self.clock.now();
            let mut state = self.state()?;
            for strategy in strategies {
                let event = state.registry.add(strategy.clone(), &self.binding)?;
                state.record(event, now);
            }

            info!(
                vault = %self.id,
                added = strategies.len(),
                total = state.registry.count(),
                "strategies added"
            );
            Ok(AdminOutcome::Executed)
        })
    }

    /// Remove `strategies`, moving what each can release into `receiving`.
    ///
    /// `receiving` must be registered and must not be in the removal list.
    /// Each removed strategy's `max_withdraw` is pulled into the vault; the
    /// sum actually received is then deposited into `receiving`. Anything a
    /// removed strategy could not release stays with it and can be recovered
    /// later with `rebalance`.
    pub fn remove_strategies(
        &self,
        caller: &AccountId,
        strategies: &[AccountId],
        receiving: &AccountId,
    ) -> CascadeResult<AdminOutcome> {
        self.transact_guarded("remove_strategies", &[], || {
            self.require_role(Role::VaultManager, caller)?;
            if let Some(outcome) = self.timelocked(OperationId::RemoveStrategies, caller)? {
                return Ok(outcome);
            }

            let destination = self
                .state()?
                .registry
                .get(receiving)
                .cloned()
                .ok_or_else(|| CascadeError::InvalidStrategy {
                    strategy: receiving.clone(),
                })?;
            if strategies.contains(receiving) {
                return Err(CascadeError::InvalidStrategy {
                    strategy: receiving.clone(),
                });
            }

            let mut recovered: Amount = 0;
            for id in strategies {
                let handle = self
                    .state()?
                    .registry
                    .get(id)
                    .cloned()
                    .ok_or_else(|| CascadeError::DuplicateOrInvalidStrategy {
                        strategy: id.clone(),
                    })?;

                let available = handle.max_withdraw(&self.id);
                if available > 0 {
                    let received = self.pull_from(&handle, available)?;
                    recovered = recovered
                        .checked_add(received)
                        .ok_or_else(|| CascadeError::overflow("recovered assets"))?;
                }

                let (_, event) = self.state()?.registry.remove(id)?;
                self.record(event)?;
            }

            if recovered > 0 {
                self.token.approve(&self.id, receiving, recovered)?;
                destination.deposit(&self.id, recovered, &self.id)?;
            }

            info!(
                vault = %self.id,
                removed = strategies.len(),
                receiving = %receiving,
                recovered,
                "strategies removed"
            );
            Ok(AdminOutcome::Executed)
        })
    }

    /// Replace the priority order. `new_order` must be a permutation of the
    /// current members.
    pub fn reorder_strategies(
        &self,
        caller: &AccountId,
        new_order: &[AccountId],
    ) -> CascadeResult<()> {
        self.transact("reorder_strategies", &[], || {
            self.require_role(Role::VaultManager, caller)?;

            let now = self.clock.now();
            let mut state = self.state()?;
            let events = state.registry.reorder(new_order, &self.binding)?;
            for event in events {
                state.record(event, now);
            }

            info!(vault = %self.id, order = ?state.registry.ids(), "strategies reordered");
            Ok(())
        })
    }

    /// Sweep the vault's idle balance into the strategies.
    ///
    /// Anyone may call this. The idle amount is booked as both the assets
    /// and the share-equivalent of the waterfall. With nothing idle it is a
    /// no-op.
    pub fn skim(&self) -> CascadeResult<Amount> {
        self.transact_guarded("skim", &[], || {
            let idle = self.token.balance_of(&self.id);
            if idle == 0 {
                return Ok(0);
            }

            let report = self.deposit_waterfall(idle, idle)?;
            info!(
                vault = %self.id,
                amount = idle,
                delivered = report.delivered(),
                declined = report.declined(),
                "idle balance skimmed"
            );
            self.record(VaultEvent::Skimmed { amount: idle })?;
            Ok(idle)
        })
    }

    /// Change the delay for a guarded operation. Top role only.
    ///
    /// The performance-fee delay can be lengthened but never shortened below
    /// its initial value.
    pub fn set_timelock_duration(
        &self,
        caller: &AccountId,
        operation: OperationId,
        duration_secs: u64,
    ) -> CascadeResult<()> {
        self.transact("set_timelock_duration", &[], || {
            self.require_role(Role::DefaultAdmin, caller)?;

            let now = self.clock.now();
            let mut state = self.state()?;
            state.timelocks.set_duration(operation, duration_secs)?;
            state.record(
                VaultEvent::TimelockDurationSet {
                    operation,
                    duration_secs,
                },
                now,
            );

            info!(vault = %self.id, operation = %operation, duration_secs, "timelock duration set");
            Ok(())
        })
    }

    /// Change the performance fee (basis points of profit).
    ///
    /// Fees already earned are charged at the old rate first.
    pub fn set_performance_fee_percent(
        &self,
        caller: &AccountId,
        fee_bps: u32,
    ) -> CascadeResult<AdminOutcome> {
        self.transact("set_performance_fee_percent", &[], || {
            self.require_role(Role::FeeManager, caller)?;
            if fee_bps > MAX_PERFORMANCE_FEE_BPS {
                return Err(CascadeError::InvalidFee {
                    bps: fee_bps,
                    max_bps: MAX_PERFORMANCE_FEE_BPS,
                });
            }
            if let Some(outcome) = self.timelocked(OperationId::SetPerformanceFee, caller)? {
                return Ok(outcome);
            }

            self.accrue_fees()?;
            self.accounting.set_performance_fee_bps(fee_bps)?;
            self.record(VaultEvent::PerformanceFeeSet { fee_bps })?;

            info!(vault = %self.id, fee_bps, "performance fee set");
            Ok(AdminOutcome::Executed)
        })
    }

    /// Change who receives fee shares.
    pub fn set_fee_recipient(
        &self,
        caller: &AccountId,
        recipient: &AccountId,
    ) -> CascadeResult<()> {
        self.transact("set_fee_recipient", &[], || {
            self.require_role(Role::FeeManager, caller)?;
            if recipient.is_null() {
                return Err(CascadeError::NullReference);
            }

            self.accrue_fees()?;
            self.accounting.set_fee_recipient(recipient.clone())?;
            self.record(VaultEvent::FeeRecipientSet {
                recipient: recipient.clone(),
            })?;

            info!(vault = %self.id, recipient = %recipient, "fee recipient set");
            Ok(())
        })
    }
}
