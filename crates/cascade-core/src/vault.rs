//! The multi-strategy vault.
//!
//! Every externally invoked operation runs through `transact`:
//!
//!   Lane → Checkpoint → [operation body] → Commit (flush events) | Rollback
//!
//! The operation body is free to mutate vault state, the token, the share
//! ledger, and any strategy it touches. If it returns `Err`, every one of
//! those is restored from the checkpoint and the error is returned unchanged,
//! so no partial effect of a failed call is ever observable. Notifications
//! are buffered in vault state and only reach the `EventSink` when the
//! outermost operation commits.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use cascade_contracts::{
    account::{AccountId, Amount, AssetId, Rounding},
    error::{CascadeError, CascadeResult},
    event::{CallId, EventRecord, VaultEvent},
    role::Role,
    timelock::{AdminOutcome, OperationId, TimelockDurations, TimelockRecord},
};

use crate::{
    guard::{ExecutionLane, ReentrancyGuard},
    registry::{Binding, StrategyRegistry},
    timelock::{GateDecision, TimelockGate},
    traits::{AccessGate, AssetToken, Clock, EventSink, ShareAccounting, Snapshot, StrategyHandle},
};

/// Static identity and delays for a vault.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// The vault's own account on the token ledger.
    pub id: AccountId,
    /// Authority every strategy must be bound to.
    pub authority: AccountId,
    /// Initial timelock delays.
    pub timelocks: TimelockDurations,
}

/// The external collaborators a vault is wired to.
pub struct VaultParts {
    pub token: Arc<dyn AssetToken>,
    pub accounting: Arc<dyn ShareAccounting>,
    pub access: Arc<dyn AccessGate>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
}

/// Mutable vault state. Cloned wholesale into every checkpoint.
#[derive(Debug, Clone)]
pub(crate) struct VaultState {
    pub(crate) registry: StrategyRegistry,
    pub(crate) timelocks: TimelockGate,
    pub(crate) pending: Vec<(VaultEvent, DateTime<Utc>)>,
}

impl VaultState {
    pub(crate) fn record(&mut self, event: VaultEvent, at: DateTime<Utc>) {
        self.pending.push((event, at));
    }
}

/// Everything needed to undo an operation.
pub(crate) struct Checkpoint {
    state: VaultState,
    token: Snapshot,
    accounting: Snapshot,
    strategies: Vec<(StrategyHandle, Snapshot)>,
}

/// Whether an operation holds the reentrancy guard while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exclusivity {
    Shared,
    Guarded,
}

/// A vault that spreads deposits across an ordered list of strategies.
pub struct MultiStrategyVault {
    pub(crate) id: AccountId,
    pub(crate) binding: Binding,
    pub(crate) token: Arc<dyn AssetToken>,
    pub(crate) accounting: Arc<dyn ShareAccounting>,
    pub(crate) access: Arc<dyn AccessGate>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) clock: Arc<dyn Clock>,
    state: Mutex<VaultState>,
    lane: ExecutionLane,
    pub(crate) guard: ReentrancyGuard,
}

impl MultiStrategyVault {
    /// Create a vault with an empty strategy list.
    ///
    /// The vault's asset is whatever `parts.token` tracks.
    pub fn new(config: VaultConfig, parts: VaultParts) -> CascadeResult<Self> {
        if config.id.is_null() {
            return Err(CascadeError::ConfigError {
                reason: "vault id must not be null".to_string(),
            });
        }
        if config.authority.is_null() {
            return Err(CascadeError::ConfigError {
                reason: "vault authority must not be null".to_string(),
            });
        }

        let binding = Binding {
            asset: parts.token.asset(),
            authority: config.authority,
        };

        info!(
            vault = %config.id,
            asset = %binding.asset,
            authority = %binding.authority,
            "multi-strategy vault initialized"
        );

        Ok(Self {
            id: config.id,
            binding,
            token: parts.token,
            accounting: parts.accounting,
            access: parts.access,
            events: parts.events,
            clock: parts.clock,
            state: Mutex::new(VaultState {
                registry: StrategyRegistry::new(),
                timelocks: TimelockGate::new(&config.timelocks),
                pending: Vec::new(),
            }),
            lane: ExecutionLane::new(),
            guard: ReentrancyGuard::new(),
        })
    }

    // ── Read-only views ──────────────────────────────────────────────────────

    /// The vault's own account.
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// The underlying asset.
    pub fn asset(&self) -> &AssetId {
        &self.binding.asset
    }

    /// The authority strategies must be bound to.
    pub fn authority(&self) -> &AccountId {
        &self.binding.authority
    }

    /// Number of registered strategies.
    pub fn strategies_count(&self) -> CascadeResult<usize> {
        Ok(self.state()?.registry.count())
    }

    /// Return true if `strategy` is registered.
    pub fn is_strategy(&self, strategy: &AccountId) -> CascadeResult<bool> {
        Ok(self.state()?.registry.contains(strategy))
    }

    /// Registered strategies in priority order.
    pub fn strategies(&self) -> CascadeResult<Vec<AccountId>> {
        Ok(self.state()?.registry.ids())
    }

    /// Timelock record for a guarded operation.
    pub fn timelock(&self, operation: OperationId) -> CascadeResult<TimelockRecord> {
        Ok(self.state()?.timelocks.record(operation))
    }

    /// Underlying asset held by the vault itself, outside any strategy.
    pub fn idle_assets(&self) -> Amount {
        self.token.balance_of(&self.id)
    }

    /// Shares held by `owner`.
    pub fn balance_of(&self, owner: &AccountId) -> Amount {
        self.accounting.balance_of(owner)
    }

    /// Shares outstanding.
    pub fn total_supply(&self) -> Amount {
        self.accounting.total_supply()
    }

    /// Assets managed on behalf of shareholders: the sum over strategies.
    pub fn total_assets(&self) -> CascadeResult<Amount> {
        self.total_managed_assets()
    }

    /// Shares `assets` would buy.
    pub fn convert_to_shares(&self, assets: Amount) -> CascadeResult<Amount> {
        self.accounting
            .convert_to_shares(assets, self.total_assets()?, Rounding::Down)
    }

    /// Assets `shares` are worth.
    pub fn convert_to_assets(&self, shares: Amount) -> CascadeResult<Amount> {
        self.accounting
            .convert_to_assets(shares, self.total_assets()?, Rounding::Down)
    }

    /// Shares a deposit of `assets` would mint now.
    pub fn preview_deposit(&self, assets: Amount) -> CascadeResult<Amount> {
        self.accounting
            .convert_to_shares(assets, self.total_assets()?, Rounding::Down)
    }

    /// Assets a mint of `shares` would cost now.
    pub fn preview_mint(&self, shares: Amount) -> CascadeResult<Amount> {
        self.accounting
            .convert_to_assets(shares, self.total_assets()?, Rounding::Up)
    }

    /// Shares a withdrawal of `assets` would burn now.
    pub fn preview_withdraw(&self, assets: Amount) -> CascadeResult<Amount> {
        self.accounting
            .convert_to_shares(assets, self.total_assets()?, Rounding::Up)
    }

    /// Assets a redemption of `shares` would pay now.
    pub fn preview_redeem(&self, shares: Amount) -> CascadeResult<Amount> {
        self.accounting
            .convert_to_assets(shares, self.total_assets()?, Rounding::Down)
    }

    /// The most `receiver` may deposit: the lower of the strategies' combined
    /// room and the accounting layer's own limit.
    pub fn max_deposit(&self, receiver: &AccountId) -> CascadeResult<Amount> {
        let limit = self
            .accounting
            .max_deposit_limit(receiver, self.total_assets()?)?;
        Ok(limit.min(self.aggregate_max_deposit()?))
    }

    /// The most shares `receiver` may mint.
    pub fn max_mint(&self, receiver: &AccountId) -> CascadeResult<Amount> {
        let assets = self.max_deposit(receiver)?;
        self.accounting
            .convert_to_shares(assets, self.total_assets()?, Rounding::Down)
    }

    /// The most `owner` may withdraw: the lower of their share value and what
    /// the strategies can release.
    pub fn max_withdraw(&self, owner: &AccountId) -> CascadeResult<Amount> {
        let owned = self.accounting.convert_to_assets(
            self.accounting.balance_of(owner),
            self.total_assets()?,
            Rounding::Down,
        )?;
        Ok(owned.min(self.aggregate_max_withdraw()?))
    }

    /// The most shares `owner` may redeem.
    pub fn max_redeem(&self, owner: &AccountId) -> CascadeResult<Amount> {
        let releasable = self.accounting.convert_to_shares(
            self.aggregate_max_withdraw()?,
            self.total_assets()?,
            Rounding::Down,
        )?;
        Ok(self.accounting.balance_of(owner).min(releasable))
    }

    // ── Tokenized-vault operations ───────────────────────────────────────────

    /// Deposit `assets` from `caller` and mint shares to `receiver`.
    ///
    /// `caller` must have approved the vault on the underlying token. The
    /// assets are pushed through the deposit waterfall; if the strategies
    /// cannot absorb all of them the whole call fails with
    /// `AllocationShortfall`.
    pub fn deposit(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
    ) -> CascadeResult<Amount> {
        self.transact("deposit", &[], || {
            if assets == 0 {
                return Err(CascadeError::ZeroAmount);
            }
            self.accrue_fees()?;
            let max = self.max_deposit(receiver)?;
            if assets > max {
                return Err(CascadeError::LimitExceeded {
                    action: "deposit".to_string(),
                    requested: assets,
                    max,
                });
            }
            let shares = self.preview_deposit(assets)?;
            self.enter_position(caller, receiver, assets, shares)?;
            Ok(shares)
        })
    }

    /// Mint exactly `shares` to `receiver`, pulling the required assets from
    /// `caller`.
    pub fn mint(
        &self,
        caller: &AccountId,
        shares: Amount,
        receiver: &AccountId,
    ) -> CascadeResult<Amount> {
        self.transact("mint", &[], || {
            if shares == 0 {
                return Err(CascadeError::ZeroAmount);
            }
            self.accrue_fees()?;
            let max = self.max_mint(receiver)?;
            if shares > max {
                return Err(CascadeError::LimitExceeded {
                    action: "mint".to_string(),
                    requested: shares,
                    max,
                });
            }
            let assets = self.preview_mint(shares)?;
            self.enter_position(caller, receiver, assets, shares)?;
            Ok(assets)
        })
    }

    /// Withdraw exactly `assets` to `receiver`, burning `owner`'s shares.
    ///
    /// A `caller` other than `owner` spends the owner's share allowance.
    pub fn withdraw(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> CascadeResult<Amount> {
        self.transact("withdraw", &[], || {
            if assets == 0 {
                return Err(CascadeError::ZeroAmount);
            }
            self.accrue_fees()?;
            let max = self.max_withdraw(owner)?;
            if assets > max {
                return Err(CascadeError::LimitExceeded {
                    action: "withdraw".to_string(),
                    requested: assets,
                    max,
                });
            }
            let shares = self.preview_withdraw(assets)?;
            self.exit_position(caller, receiver, owner, assets, shares)?;
            Ok(shares)
        })
    }

    /// Redeem exactly `shares` of `owner`'s, sending the assets to `receiver`.
    pub fn redeem(
        &self,
        caller: &AccountId,
        shares: Amount,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> CascadeResult<Amount> {
        self.transact("redeem", &[], || {
            if shares == 0 {
                return Err(CascadeError::ZeroAmount);
            }
            self.accrue_fees()?;
            let max = self.max_redeem(owner)?;
            if shares > max {
                return Err(CascadeError::LimitExceeded {
                    action: "redeem".to_string(),
                    requested: shares,
                    max,
                });
            }
            let assets = self.preview_redeem(shares)?;
            if assets == 0 {
                return Err(CascadeError::ZeroAmount);
            }
            self.exit_position(caller, receiver, owner, assets, shares)?;
            Ok(assets)
        })
    }

    /// Let `spender` withdraw or redeem up to `shares` of `owner`'s shares.
    pub fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        shares: Amount,
    ) -> CascadeResult<()> {
        self.transact("approve", &[], || {
            self.accounting.approve(owner, spender, shares)
        })
    }

    /// Base accounting step followed by the deposit waterfall.
    fn enter_position(
        &self,
        caller: &AccountId,
        receiver: &AccountId,
        assets: Amount,
        shares: Amount,
    ) -> CascadeResult<()> {
        self.token.transfer_from(&self.id, caller, &self.id, assets)?;
        self.accounting.mint(receiver, shares)?;

        let report = self.deposit_waterfall(assets, shares)?;
        debug!(
            vault = %self.id,
            assets,
            shares,
            delivered = report.delivered(),
            declined = report.declined(),
            "deposit allocated"
        );

        self.accounting.checkpoint_assets(self.total_assets()?)?;
        self.record(VaultEvent::Deposited {
            caller: caller.clone(),
            receiver: receiver.clone(),
            assets,
            shares,
        })
    }

    /// Withdrawal waterfall followed by the base accounting step.
    fn exit_position(
        &self,
        caller: &AccountId,
        receiver: &AccountId,
        owner: &AccountId,
        assets: Amount,
        shares: Amount,
    ) -> CascadeResult<()> {
        if caller != owner {
            self.accounting.spend_allowance(owner, caller, shares)?;
        }

        let report = self.withdraw_waterfall(assets, shares)?;
        debug!(
            vault = %self.id,
            assets,
            shares,
            delivered = report.delivered(),
            declined = report.declined(),
            "withdrawal sourced"
        );

        self.accounting.burn(owner, shares)?;
        self.token.transfer(&self.id, receiver, assets)?;

        self.accounting.checkpoint_assets(self.total_assets()?)?;
        self.record(VaultEvent::Withdrawn {
            caller: caller.clone(),
            receiver: receiver.clone(),
            owner: owner.clone(),
            assets,
            shares,
        })
    }

    /// Charge the performance fee on growth since the last checkpoint.
    pub(crate) fn accrue_fees(&self) -> CascadeResult<Amount> {
        let fee_shares = self.accounting.accrue_fees(self.total_assets()?)?;
        if fee_shares > 0 {
            debug!(vault = %self.id, fee_shares, "performance fee accrued");
        }
        Ok(fee_shares)
    }

    // ── Execution substrate ──────────────────────────────────────────────────

    /// Run `body` as one atomic operation.
    ///
    /// `extra` names strategies the body may touch that are not registered
    /// (for example the source of a rebalance); registered strategies are
    /// always covered.
    pub(crate) fn transact<T>(
        &self,
        operation: &'static str,
        extra: &[StrategyHandle],
        body: impl FnOnce() -> CascadeResult<T>,
    ) -> CascadeResult<T> {
        self.execute(operation, Exclusivity::Shared, extra, body)
    }

    /// Like `transact`, but also holds the reentrancy guard for the whole
    /// call. Used by operations that trust a balance read taken after an
    /// outbound strategy call.
    pub(crate) fn transact_guarded<T>(
        &self,
        operation: &'static str,
        extra: &[StrategyHandle],
        body: impl FnOnce() -> CascadeResult<T>,
    ) -> CascadeResult<T> {
        self.execute(operation, Exclusivity::Guarded, extra, body)
    }

    /// Lane → reentrancy check → checkpoint → body → commit | rollback.
    ///
    /// A top-level call from another thread waits in the lane. A nested call
    /// (a strategy calling back into this vault) fails with `Reentrancy`
    /// while a guarded operation is running.
    fn execute<T>(
        &self,
        operation: &'static str,
        exclusivity: Exclusivity,
        extra: &[StrategyHandle],
        body: impl FnOnce() -> CascadeResult<T>,
    ) -> CascadeResult<T> {
        let ticket = self.lane.enter()?;
        if !ticket.is_outermost() && self.guard.is_locked() {
            warn!(
                vault = %self.id,
                operation,
                "nested call rejected while a guarded operation runs"
            );
            return Err(CascadeError::Reentrancy);
        }
        let _guard = match exclusivity {
            Exclusivity::Guarded => Some(self.guard.enter()?),
            Exclusivity::Shared => None,
        };
        let checkpoint = self.checkpoint(extra)?;

        let result = body().and_then(|value| {
            if ticket.is_outermost() {
                self.flush_events()?;
            }
            Ok(value)
        });

        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(
                    vault = %self.id,
                    operation,
                    error = %err,
                    "operation failed, rolling back"
                );
                if let Err(rollback_err) = self.rollback(checkpoint) {
                    error!(
                        vault = %self.id,
                        operation,
                        error = %rollback_err,
                        "rollback failed"
                    );
                    return Err(rollback_err);
                }
                Err(err)
            }
        }
    }

    /// Capture vault state, token, share ledger, registered strategies, and
    /// any `extra` strategies.
    pub(crate) fn checkpoint(&self, extra: &[StrategyHandle]) -> CascadeResult<Checkpoint> {
        let state = self.state()?.clone();

        let mut strategies = Vec::with_capacity(state.registry.count() + extra.len());
        for handle in state.registry.iter().chain(extra.iter()) {
            let id = handle.id();
            if strategies
                .iter()
                .any(|(seen, _): &(StrategyHandle, Snapshot)| seen.id() == id)
            {
                continue;
            }
            strategies.push((Arc::clone(handle), handle.snapshot()?));
        }

        Ok(Checkpoint {
            token: self.token.snapshot()?,
            accounting: self.accounting.snapshot()?,
            strategies,
            state,
        })
    }

    /// Restore everything captured in `checkpoint`.
    pub(crate) fn rollback(&self, checkpoint: Checkpoint) -> CascadeResult<()> {
        for (handle, snapshot) in &checkpoint.strategies {
            handle.restore(snapshot)?;
        }
        self.token.restore(&checkpoint.token)?;
        self.accounting.restore(&checkpoint.accounting)?;
        *self.state()? = checkpoint.state;
        Ok(())
    }

    /// Hand buffered notifications to the event sink as one batch.
    fn flush_events(&self) -> CascadeResult<()> {
        let pending = std::mem::take(&mut self.state()?.pending);
        if pending.is_empty() {
            return Ok(());
        }

        let call_id = CallId::new();
        let records: Vec<EventRecord> = pending
            .into_iter()
            .map(|(event, timestamp)| EventRecord {
                call_id,
                vault: self.id.clone(),
                event,
                timestamp,
            })
            .collect();
        self.events.emit_batch(&records)
    }

    /// Buffer a notification for the current operation.
    pub(crate) fn record(&self, event: VaultEvent) -> CascadeResult<()> {
        let now = self.clock.now();
        self.state()?.record(event, now);
        Ok(())
    }

    pub(crate) fn state(&self) -> CascadeResult<MutexGuard<'_, VaultState>> {
        self.state.lock().map_err(|e| CascadeError::LockPoisoned {
            reason: format!("vault state: {e}"),
        })
    }

    // ── Authorization ────────────────────────────────────────────────────────

    /// Fail with `Unauthorized` unless `caller` holds `role` or the top role.
    pub(crate) fn require_role(&self, role: Role, caller: &AccountId) -> CascadeResult<()> {
        if self.access.has_role(role, caller) || self.access.has_role(Role::DefaultAdmin, caller) {
            return Ok(());
        }
        warn!(vault = %self.id, account = %caller, role = %role, "access denied");
        Err(CascadeError::Unauthorized {
            account: caller.clone(),
            role,
        })
    }

    /// Consult the timelock for `operation`.
    ///
    /// Returns `Some(outcome)` when the caller must stop here, `None` when
    /// the guarded change should run now.
    pub(crate) fn timelocked(
        &self,
        operation: OperationId,
        caller: &AccountId,
    ) -> CascadeResult<Option<AdminOutcome>> {
        let bypass = self.access.has_role(Role::DefaultAdmin, caller);
        let now = self.clock.now();
        let decision = self.state()?.timelocks.check(operation, now, bypass);

        match decision {
            GateDecision::Proceed => Ok(None),
            GateDecision::Armed { ready_at } => {
                info!(
                    vault = %self.id,
                    operation = %operation,
                    %ready_at,
                    "timelock armed"
                );
                self.record(VaultEvent::TimelockArmed { operation, ready_at })?;
                Ok(Some(AdminOutcome::Armed { ready_at }))
            }
            GateDecision::Pending { ready_at } => {
                debug!(
                    vault = %self.id,
                    operation = %operation,
                    %ready_at,
                    "timelock still pending"
                );
                Ok(Some(AdminOutcome::Pending { ready_at }))
            }
        }
    }
}
