//! Policy engine types.

use std::path::PathBuf;

use crate::storage::{DatabaseError, Decision};

/// Uid of the distinguished shell subject, always represented in the
/// reconciled list even without an installed application.
pub const SHELL_UID: i64 = 2000;
/// Package identifier attached to the synthetic shell entry.
pub const SHELL_PACKAGE: &str = "com.android.shell";
/// Display label attached to the synthetic shell entry.
pub const SHELL_LABEL: &str = "Shell";

/// Identity of the engine's own process; excluded from every reconciled
/// list (self cannot authorize itself).
#[derive(Debug, Clone)]
pub struct EngineIdentity {
    /// OS identity the engine runs as.
    pub uid: i64,
    /// The engine's own package identifier, skipped during enumeration.
    pub package: String,
}

/// One reconciled, presentable authorization entry.
///
/// Ephemeral: rebuilt on every reconciliation pass. Exactly one entry exists
/// per distinct uid; when packages share a uid, the first package encountered
/// supplies the metadata while the decision applies to the uid as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
    pub uid: i64,
    pub package: String,
    pub label: String,
    pub icon: Option<PathBuf>,
    pub shared_uid: bool,
    pub decision: Decision,
    pub notify: bool,
    pub logging: bool,
}

/// Transient notification events for the presentation adapter.
///
/// Labels are display names; localization is the adapter's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Elevated access granted to the named subject.
    Granted { label: String },
    /// Elevated access denied (record removed) for the named subject.
    Denied { label: String },
    /// Grant record revoked; the subject reverts to undecided.
    Revoked { label: String },
    /// Every grant record revoked.
    AllRevoked,
    /// Notify flag changed.
    NotifyChanged { label: String, enabled: bool },
    /// Logging flag changed.
    LoggingChanged { label: String, enabled: bool },
    /// A mutation's store write failed; the list was not refreshed.
    /// Carries the subject name when the mutation targeted one entry.
    MutationFailed { label: Option<String> },
    /// A reconciliation pass failed; the previous list remains displayed.
    ReloadFailed,
}

/// Reconciliation pass errors.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error("Inventory enumeration failed: {0}")]
    Inventory(String),
}
