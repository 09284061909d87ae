//! Trait definitions for everything the vault talks to.
//!
//! These traits define the trust boundary:
//!
//! - `Strategy`:        untrusted sub-vault (may revert or under-deliver)
//! - `AssetToken`:      the underlying asset ledger
//! - `ShareAccounting`: trusted share mint/burn and conversion math
//! - `AccessGate`:      trusted role check (consulted before every privileged call)
//! - `EventSink`:       trusted notification store
//! - `Clock`:           time source for timelocks and event timestamps
//!
//! Anything the vault mutates through one of these traits must also be
//! `Journaled`, so that a failed operation can be undone as if it never ran.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use cascade_contracts::{
    account::{AccountId, Amount, AssetId, Rounding},
    error::{CascadeError, CascadeResult},
    event::EventRecord,
    role::Role,
};

/// Opaque captured state of a journaled component.
///
/// The vault never inspects a snapshot; it only hands it back to the
/// component that produced it.
pub struct Snapshot(Box<dyn Any + Send + Sync>);

impl Snapshot {
    /// Wrap a component's captured state.
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self(Box::new(state))
    }

    /// Borrow the captured state as `T`.
    ///
    /// Fails with `SnapshotFailed` if the snapshot was produced by a
    /// different kind of component.
    pub fn downcast<T: Any>(&self) -> CascadeResult<&T> {
        self.0
            .downcast_ref::<T>()
            .ok_or_else(|| CascadeError::SnapshotFailed {
                reason: format!("snapshot does not hold a {}", std::any::type_name::<T>()),
            })
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Snapshot(..)")
    }
}

/// A component whose state can be captured and rolled back.
pub trait Journaled {
    /// Capture the component's full mutable state.
    fn snapshot(&self) -> CascadeResult<Snapshot>;

    /// Replace the component's state with a previously captured snapshot.
    fn restore(&self, snapshot: &Snapshot) -> CascadeResult<()>;
}

/// A pluggable sub-vault the multi-strategy vault allocates capital to.
///
/// Implementations are **untrusted**. The vault tolerates a strategy that
/// fails a call or delivers less than asked; it does not defend against one
/// that lies about its capacity.
///
/// Methods take `&self`; implementations keep their state behind interior
/// mutability so that handles can be shared as `Arc<dyn Strategy>`.
pub trait Strategy: Journaled + Send + Sync {
    /// The strategy's own account. Must not be null for a registered strategy.
    fn id(&self) -> AccountId;

    /// The asset this strategy accepts.
    fn underlying_asset(&self) -> AssetId;

    /// The authority this strategy is bound to.
    fn authority(&self) -> AccountId;

    /// Assets currently under management, valued in the underlying asset.
    fn total_assets(&self) -> Amount;

    /// The most `receiver` could deposit right now.
    fn max_deposit(&self, receiver: &AccountId) -> Amount;

    /// The most `owner` could withdraw right now.
    fn max_withdraw(&self, owner: &AccountId) -> Amount;

    /// Pull `assets` from `caller` (through an allowance on the underlying
    /// token) and credit shares to `receiver`. Returns the shares minted.
    fn deposit(&self, caller: &AccountId, assets: Amount, receiver: &AccountId)
        -> CascadeResult<Amount>;

    /// Burn `owner`'s shares and send `assets` to `receiver`. Returns the
    /// shares burned. The amount actually delivered may be lower than
    /// `assets`; callers must measure it.
    fn withdraw(
        &self,
        caller: &AccountId,
        assets: Amount,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> CascadeResult<Amount>;
}

/// Shared handle to a strategy. The registry stores only these.
pub type StrategyHandle = Arc<dyn Strategy>;

/// The underlying asset ledger.
pub trait AssetToken: Journaled + Send + Sync {
    /// The asset this ledger tracks.
    fn asset(&self) -> AssetId;

    /// Current balance of `account`.
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> CascadeResult<()>;

    /// Set the allowance `spender` may move out of `owner`'s balance.
    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> CascadeResult<()>;

    /// Current allowance from `owner` to `spender`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> CascadeResult<()>;
}

/// Tokenized-share bookkeeping for the vault's own shares.
///
/// The vault supplies `total_assets` to every conversion; the accounting
/// layer never asks the strategies itself.
pub trait ShareAccounting: Journaled + Send + Sync {
    /// Shares outstanding.
    fn total_supply(&self) -> Amount;

    /// Shares held by `owner`.
    fn balance_of(&self, owner: &AccountId) -> Amount;

    /// Convert an asset amount to shares at the given total assets.
    fn convert_to_shares(&self, assets: Amount, total_assets: Amount, rounding: Rounding)
        -> CascadeResult<Amount>;

    /// Convert a share amount to assets at the given total assets.
    fn convert_to_assets(&self, shares: Amount, total_assets: Amount, rounding: Rounding)
        -> CascadeResult<Amount>;

    /// Per-actor deposit limit imposed by the accounting layer (supply cap).
    fn max_deposit_limit(
        &self,
        receiver: &AccountId,
        total_assets: Amount,
    ) -> CascadeResult<Amount>;

    /// Mint `shares` to `to`.
    fn mint(&self, to: &AccountId, shares: Amount) -> CascadeResult<()>;

    /// Burn `shares` from `from`.
    fn burn(&self, from: &AccountId, shares: Amount) -> CascadeResult<()>;

    /// Let `spender` redeem up to `shares` of `owner`'s shares.
    fn approve(&self, owner: &AccountId, spender: &AccountId, shares: Amount) -> CascadeResult<()>;

    /// Consume `shares` of allowance from `owner` to `spender`.
    fn spend_allowance(&self, owner: &AccountId, spender: &AccountId, shares: Amount)
        -> CascadeResult<()>;

    /// Charge the performance fee on growth since the last checkpoint.
    /// Returns the fee shares minted.
    fn accrue_fees(&self, total_assets: Amount) -> CascadeResult<Amount>;

    /// Record `total_assets` as the new fee checkpoint.
    fn checkpoint_assets(&self, total_assets: Amount) -> CascadeResult<()>;

    /// Current performance fee in basis points.
    fn performance_fee_bps(&self) -> u32;

    /// Change the performance fee.
    fn set_performance_fee_bps(&self, fee_bps: u32) -> CascadeResult<()>;

    /// Current fee recipient.
    fn fee_recipient(&self) -> AccountId;

    /// Change the fee recipient.
    fn set_fee_recipient(&self, recipient: AccountId) -> CascadeResult<()>;
}

/// Role-based authorization.
pub trait AccessGate: Send + Sync {
    /// Return true if `account` holds `role`.
    fn has_role(&self, role: Role, account: &AccountId) -> bool;
}

/// Sink for committed vault notifications.
///
/// A failed write is fatal: the operation that produced the records is
/// rolled back.
pub trait EventSink: Send + Sync {
    /// Append the notifications of one committed call, in order.
    ///
    /// All or nothing: on `Err` none of `records` may remain in the sink.
    fn emit_batch(&self, records: &[EventRecord]) -> CascadeResult<()>;

    /// Append one committed notification.
    fn emit(&self, record: &EventRecord) -> CascadeResult<()> {
        self.emit_batch(std::slice::from_ref(record))
    }
}

/// Time source.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
