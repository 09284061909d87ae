//! Role-based access control types.
//!
//! Every privileged vault entry point names the role it requires. Roles are
//! granted by the hosting application (see `cascade-policy`) and are only
//! ever checked, never granted, by the vault itself.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named privilege.
///
/// `DefaultAdmin` is the top role: it may configure timelock durations and
/// bypasses every timelock gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    DefaultAdmin,
    VaultManager,
    Rebalancer,
    FeeManager,
}

impl Role {
    /// Stable kebab-case name, as written in grant files and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::DefaultAdmin => "default-admin",
            Role::VaultManager => "vault-manager",
            Role::Rebalancer => "rebalancer",
            Role::FeeManager => "fee-manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of roles held by one account.
#[derive(Debug, Clone, Default)]
pub struct RoleSet {
    inner: HashSet<Role>,
}

impl RoleSet {
    /// Grant a role to this set.
    pub fn grant(&mut self, role: Role) {
        self.inner.insert(role);
    }

    /// Remove a role from this set. Returns true if it was held.
    pub fn revoke(&mut self, role: Role) -> bool {
        self.inner.remove(&role)
    }

    /// Return true if the set contains the given role.
    pub fn has(&self, role: Role) -> bool {
        self.inner.contains(&role)
    }

    /// Return an iterator over all granted roles.
    pub fn all(&self) -> impl Iterator<Item = &Role> {
        self.inner.iter()
    }
}
