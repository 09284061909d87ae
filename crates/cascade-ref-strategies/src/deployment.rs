//! A fully wired reference vault.
//!
//! `Deployment` builds every collaborator from a `VaultSettings` document:
//! an `InMemoryToken` for the asset, a `ShareLedger` with the configured fee
//! and cap, a `TomlAccessGate` from the grants, a hash-chained
//! `InMemoryEventLog`, and a `ManualClock` so timelocks can be stepped
//! through deterministically. It keeps a handle to each so scenarios and
//! tests can inspect them after the vault has run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use cascade_accounting::{InMemoryToken, ShareLedger};
use cascade_audit::InMemoryEventLog;
use cascade_contracts::{
    account::{AccountId, Amount},
    error::CascadeResult,
    timelock::AdminOutcome,
};
use cascade_core::{
    clock::ManualClock,
    traits::{AssetToken, StrategyHandle},
    vault::{MultiStrategyVault, VaultParts},
};
use cascade_policy::{TomlAccessGate, VaultSettings};

use crate::capped::CappedStrategy;

/// Settings for the reference deployment.
pub const REFERENCE_SETTINGS: &str = include_str!("../settings/reference.toml");

// ── Well-known accounts in the reference settings ────────────────────────────

pub const ADMIN: &str = "admin";
pub const MANAGER: &str = "manager";
pub const KEEPER: &str = "keeper";
pub const TREASURER: &str = "treasurer";
pub const TREASURY: &str = "treasury";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

/// 2024-01-01T00:00:00Z
const GENESIS_TIMESTAMP: i64 = 1_704_067_200;

pub struct Deployment {
    pub settings: VaultSettings,
    pub token: Arc<InMemoryToken>,
    pub shares: Arc<ShareLedger>,
    pub log: InMemoryEventLog,
    pub clock: Arc<ManualClock>,
    pub vault: Arc<MultiStrategyVault>,
}

impl Deployment {
    /// Deploy the embedded reference settings.
    pub fn reference() -> CascadeResult<Self> {
        Self::from_settings(VaultSettings::from_toml_str(REFERENCE_SETTINGS)?)
    }

    /// Deploy a vault described by `settings`.
    pub fn from_settings(settings: VaultSettings) -> CascadeResult<Self> {
        let token = Arc::new(InMemoryToken::new(settings.vault.asset.clone()));

        let mut shares =
            ShareLedger::new(settings.fee_recipient(), settings.fees.performance_fee_bps)?;
        if let Some(cap) = settings.fees.supply_cap {
            shares = shares.with_supply_cap(cap);
        }
        let shares = Arc::new(shares);

        let log = InMemoryEventLog::new(settings.vault.id.clone());
        let start = DateTime::<Utc>::from_timestamp(GENESIS_TIMESTAMP, 0).unwrap_or_default();
        let clock = Arc::new(ManualClock::new(start));

        let vault = MultiStrategyVault::new(
            settings.vault_config(),
            VaultParts {
                token: token.clone(),
                accounting: shares.clone(),
                access: Arc::new(TomlAccessGate::from_grants(&settings.grants)),
                events: Arc::new(log.clone()),
                clock: clock.clone(),
            },
        )?;

        info!(
            vault = %settings.vault.id,
            grants = settings.grants.len(),
            "reference deployment ready"
        );

        Ok(Self {
            settings,
            token,
            shares,
            log,
            clock,
            vault: Arc::new(vault),
        })
    }

    /// A well-behaved strategy bound to this vault's asset and authority.
    pub fn strategy(&self, name: &str) -> CappedStrategy {
        CappedStrategy::new(name, self.vault.authority().clone(), self.token.clone())
    }

    /// Mint `amount` to `account` and let the vault pull all of it.
    pub fn fund(&self, account: &str, amount: Amount) -> CascadeResult<()> {
        let account = AccountId::new(account);
        self.token.mint(&account, amount)?;
        self.token.approve(&account, self.vault.id(), Amount::MAX)
    }

    /// Register `strategies` immediately, using the top role to skip the
    /// timelock.
    pub fn install(&self, strategies: &[StrategyHandle]) -> CascadeResult<AdminOutcome> {
        self.vault.add_strategies(&AccountId::new(ADMIN), strategies)
    }

    /// Tokens minted straight into a strategy's account, read as yield.
    pub fn accrue_yield(&self, strategy: &AccountId, amount: Amount) -> CascadeResult<()> {
        self.token.mint(strategy, amount)
    }

    /// Underlying token balance of `account`.
    pub fn balance(&self, account: &str) -> Amount {
        self.token.balance_of(&AccountId::new(account))
    }

    /// Tokens held by the vault and every registered strategy.
    pub fn vault_holdings(&self) -> CascadeResult<Amount> {
        let mut held = self.token.balance_of(self.vault.id());
        for id in self.vault.strategies()? {
            held = held.saturating_add(self.token.balance_of(&id));
        }
        Ok(held)
    }
}

pub fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}
