//! Vault settings schema.
//!
//! A settings file names the vault, its asset and authority, the initial
//! timelock delays, the fee configuration, and the role grants:
//!
//! ```toml
//! [vault]
//! id = "vault"
//! asset = "usdc"
//! authority = "authority"
//!
//! [timelocks]
//! add_strategies_secs = 172800
//!
//! [fees]
//! performance_fee_bps = 1000
//! recipient = "treasury"
//!
//! [[grants]]
//! role = "vault-manager"
//! accounts = ["ops"]
//! ```
//!
//! `[timelocks]` and `[fees]` may be omitted; missing timelock entries fall
//! back to the built-in delays.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cascade_contracts::{
    account::{AccountId, Amount, AssetId},
    error::{CascadeError, CascadeResult},
    role::Role,
    timelock::TimelockDurations,
    DEFAULT_ADD_STRATEGIES_DELAY_SECS, DEFAULT_PERFORMANCE_FEE_DELAY_SECS,
    DEFAULT_REMOVE_STRATEGIES_DELAY_SECS, MAX_PERFORMANCE_FEE_BPS,
};
use cascade_core::vault::VaultConfig;

/// `[vault]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    pub id: AccountId,
    pub asset: AssetId,
    pub authority: AccountId,
}

/// `[timelocks]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockSection {
    #[serde(default = "default_add_secs")]
    pub add_strategies_secs: u64,
    #[serde(default = "default_remove_secs")]
    pub remove_strategies_secs: u64,
    #[serde(default = "default_fee_secs")]
    pub performance_fee_secs: u64,
}

impl Default for TimelockSection {
    fn default() -> Self {
        Self {
            add_strategies_secs: DEFAULT_ADD_STRATEGIES_DELAY_SECS,
            remove_strategies_secs: DEFAULT_REMOVE_STRATEGIES_DELAY_SECS,
            performance_fee_secs: DEFAULT_PERFORMANCE_FEE_DELAY_SECS,
        }
    }
}

fn default_add_secs() -> u64 {
    DEFAULT_ADD_STRATEGIES_DELAY_SECS
}

fn default_remove_secs() -> u64 {
    DEFAULT_REMOVE_STRATEGIES_DELAY_SECS
}

fn default_fee_secs() -> u64 {
    DEFAULT_PERFORMANCE_FEE_DELAY_SECS
}

/// `[fees]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSection {
    #[serde(default)]
    pub performance_fee_bps: u32,
    /// Required when `performance_fee_bps` is non-zero.
    pub recipient: Option<AccountId>,
    /// Upper bound on shares outstanding.
    pub supply_cap: Option<Amount>,
}

/// One `[[grants]]` entry: a role and the accounts that hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub accounts: Vec<AccountId>,
}

/// The top-level structure deserialized from a settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSettings {
    pub vault: VaultSection,
    #[serde(default)]
    pub timelocks: TimelockSection,
    #[serde(default)]
    pub fees: FeeSection,
    #[serde(default)]
    pub grants: Vec<RoleGrant>,
}

impl VaultSettings {
    /// Parse `s` as TOML and validate it.
    ///
    /// Returns `CascadeError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or fails validation.
    pub fn from_toml_str(s: &str) -> CascadeResult<Self> {
        let settings: VaultSettings = toml::from_str(s).map_err(|e| CascadeError::ConfigError {
            reason: format!("failed to parse vault settings TOML: {}", e),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read the file at `path` and parse it as vault settings.
    pub fn from_file(path: &Path) -> CascadeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CascadeError::ConfigError {
            reason: format!("failed to read vault settings '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> CascadeResult<()> {
        if self.vault.id.is_null() {
            return Err(config_error("vault.id must not be empty"));
        }
        if self.vault.authority.is_null() {
            return Err(config_error("vault.authority must not be empty"));
        }
        if self.vault.asset.0.is_empty() {
            return Err(config_error("vault.asset must not be empty"));
        }
        if self.fees.performance_fee_bps > MAX_PERFORMANCE_FEE_BPS {
            return Err(config_error(&format!(
                "fees.performance_fee_bps {} exceeds {}",
                self.fees.performance_fee_bps, MAX_PERFORMANCE_FEE_BPS
            )));
        }
        if self.fees.performance_fee_bps > 0 && self.fee_recipient().is_null() {
            return Err(config_error("fees.recipient is required when a fee is set"));
        }
        if let Some(grant) = self
            .grants
            .iter()
            .find(|grant| grant.accounts.iter().any(AccountId::is_null))
        {
            return Err(config_error(&format!(
                "grant for role '{}' lists an empty account",
                grant.role
            )));
        }
        Ok(())
    }

    /// Initial timelock delays.
    pub fn durations(&self) -> TimelockDurations {
        TimelockDurations {
            add_strategies_secs: self.timelocks.add_strategies_secs,
            remove_strategies_secs: self.timelocks.remove_strategies_secs,
            performance_fee_secs: self.timelocks.performance_fee_secs,
        }
    }

    /// The static configuration a `MultiStrategyVault` is built from.
    pub fn vault_config(&self) -> VaultConfig {
        VaultConfig {
            id: self.vault.id.clone(),
            authority: self.vault.authority.clone(),
            timelocks: self.durations(),
        }
    }

    /// Fee recipient, or the null account if none is configured.
    pub fn fee_recipient(&self) -> AccountId {
        self.fees.recipient.clone().unwrap_or_else(AccountId::null)
    }
}

fn config_error(reason: &str) -> CascadeError {
    CascadeError::ConfigError {
        reason: reason.to_string(),
    }
}
