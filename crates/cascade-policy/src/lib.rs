//! # cascade-policy
//!
//! Settings and role grants for a Cascade vault, read from TOML.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use cascade_policy::{TomlAccessGate, VaultSettings};
//!
//! let settings = VaultSettings::from_file(Path::new("vault.toml"))?;
//! let gate = TomlAccessGate::from_grants(&settings.grants);
//! // Pass `settings.vault_config()` and `gate` to `MultiStrategyVault::new`.
//! ```
//!
//! ## Grants
//!
//! Roles are deny-by-default: an account holds a role only if a `[[grants]]`
//! entry lists it. The vault itself treats `default-admin` as satisfying
//! every role check.

pub mod gate;
pub mod settings;

pub use gate::TomlAccessGate;
pub use settings::{FeeSection, RoleGrant, TimelockSection, VaultSection, VaultSettings};

// ── Tests ─────────────────────────────────────────────────────────────────────
