//! Account, asset, and amount primitives.
//!
//! Every participant the vault talks to (depositors, strategies, the vault
//! itself, the fee recipient) is addressed by an `AccountId`. The underlying
//! asset is named by an `AssetId`. Neither type carries behaviour; they exist
//! so that signatures say which kind of string they expect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token quantity in the smallest unit of the underlying asset (or of shares).
pub type Amount = u128;

/// Stable identifier for any account: a user, a strategy, or the vault.
///
/// The empty identifier is the null account. Registries reject it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Construct an account identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null account.
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Return true if this is the null account.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("<null>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of an underlying asset (e.g. "usdc").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Construct an asset identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rounding direction for share/asset conversions.
///
/// Conversions always round against the caller: down when the vault pays
/// out, up when the vault is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    Down,
    Up,
}
