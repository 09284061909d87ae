//! Deny-by-default role gate.
//!
//! `TomlAccessGate` holds a `RoleSet` per account. An account with no entry,
//! or whose set lacks the requested role, is refused.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use cascade_contracts::{
    account::AccountId,
    error::CascadeResult,
    role::{Role, RoleSet},
};
use cascade_core::traits::AccessGate;

use crate::settings::{RoleGrant, VaultSettings};

/// An `AccessGate` built from `[[grants]]` tables.
///
/// ```rust,ignore
/// use cascade_policy::TomlAccessGate;
///
/// let gate = TomlAccessGate::from_file(Path::new("vault.toml"))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlAccessGate {
    holders: HashMap<AccountId, RoleSet>,
}

impl TomlAccessGate {
    /// A gate that refuses everyone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a gate from a list of grants.
    pub fn from_grants(grants: &[RoleGrant]) -> Self {
        let mut gate = Self::new();
        for grant in grants {
            for account in &grant.accounts {
                gate.grant(grant.role, account.clone());
            }
        }
        gate
    }

    /// Parse a settings document and keep only its grants.
    pub fn from_toml_str(s: &str) -> CascadeResult<Self> {
        Ok(Self::from_grants(&VaultSettings::from_toml_str(s)?.grants))
    }

    /// Read a settings file and keep only its grants.
    pub fn from_file(path: &Path) -> CascadeResult<Self> {
        Ok(Self::from_grants(&VaultSettings::from_file(path)?.grants))
    }

    /// Builder form of `grant`.
    pub fn with_grant(mut self, role: Role, account: impl Into<AccountId>) -> Self {
        self.grant(role, account.into());
        self
    }

    /// Give `role` to `account`.
    pub fn grant(&mut self, role: Role, account: AccountId) {
        self.holders.entry(account).or_default().grant(role);
    }

    /// Take `role` from `account`. Returns true if it was held.
    pub fn revoke(&mut self, role: Role, account: &AccountId) -> bool {
        self.holders
            .get_mut(account)
            .map(|roles| roles.revoke(role))
            .unwrap_or(false)
    }

    /// Roles held by `account`.
    pub fn roles_of(&self, account: &AccountId) -> Vec<Role> {
        self.holders
            .get(account)
            .map(|roles| roles.all().copied().collect())
            .unwrap_or_default()
    }
}

impl AccessGate for TomlAccessGate {
    fn has_role(&self, role: Role, account: &AccountId) -> bool {
        let held = self
            .holders
            .get(account)
            .map(|roles| roles.has(role))
            .unwrap_or(false);
        debug!(account = %account, role = %role, held, "role check");
        held
    }
}
