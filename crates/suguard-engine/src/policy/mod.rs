//! Policy reconciliation and mutation.
//!
//! Merges the grant store with the live package inventory into an ordered
//! presentation list, and applies user-initiated mutations back to the store.

mod coordinator;
mod reconciler;
mod state;
mod types;

pub use coordinator::MutationCoordinator;
pub use reconciler::Reconciler;
pub use state::{PolicyState, Snapshot};
pub use types::{
    EngineIdentity, Notice, PolicyEntry, ReconcileError, SHELL_LABEL, SHELL_PACKAGE, SHELL_UID,
};

pub use crate::storage::Decision;
