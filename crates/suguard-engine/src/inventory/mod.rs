//! Installed-application inventory contract.
//!
//! Enumeration and metadata resolution run inside a privileged helper
//! process; the engine only sees this trait. Enumeration may include
//! recently-removed packages so stale-record logic still observes them
//! during a grace window.

use std::path::PathBuf;

use async_trait::async_trait;

/// Metadata for one installed package, resolved by the privileged helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    /// Reverse-domain application identifier.
    pub package: String,
    /// OS identity the package runs as.
    pub uid: i64,
    /// Whether this uid is shared across multiple installed packages.
    pub shared_uid: bool,
    /// Human-readable display name.
    pub label: String,
    /// Resolved icon location, when the helper could extract one.
    pub icon: Option<PathBuf>,
}

/// Inventory provider errors.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Helper failure: {0}")]
    Helper(String),
}

/// Interface to the installed-application inventory.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Enumerate installed package identifiers.
    async fn list_packages(&self) -> Result<Vec<String>, InventoryError>;

    /// Resolve metadata for one package. A package that vanished between
    /// enumeration and resolution surfaces as [`InventoryError::NotFound`].
    async fn resolve(&self, package: &str) -> Result<InventoryEntry, InventoryError>;
}
