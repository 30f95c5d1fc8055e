//! Reconciliation engine.
//!
//! Merges the grant store with the live package inventory into one ordered
//! list of policy entries, pruning stale records along the way.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use suguard_core::config::GrantDefaults;

use crate::inventory::{InventoryEntry, InventoryProvider};
use crate::storage::{Database, Decision, GrantRecord};

use super::types::{
    EngineIdentity, PolicyEntry, ReconcileError, SHELL_LABEL, SHELL_PACKAGE, SHELL_UID,
};

/// Merges store and inventory state into an ordered policy list.
pub struct Reconciler {
    db: Database,
    inventory: Arc<dyn InventoryProvider>,
    identity: EngineIdentity,
    defaults: GrantDefaults,
}

impl Reconciler {
    pub fn new(
        db: Database,
        inventory: Arc<dyn InventoryProvider>,
        identity: EngineIdentity,
        defaults: GrantDefaults,
    ) -> Self {
        Self {
            db,
            inventory,
            identity,
            defaults,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Idempotent with respect to decisions: only stale rows and any record
    /// for the engine's own uid are removed from the store. Store and
    /// enumeration failures propagate; per-package metadata failures skip
    /// that package.
    pub async fn reconcile(&self) -> Result<Vec<PolicyEntry>, ReconcileError> {
        let resolved = self.resolve_inventory().await?;

        // Purge before reading: no stale row may survive into the merge.
        // The shell subject is exempt even without an installed package.
        let mut known: HashSet<i64> = resolved.iter().map(|item| item.uid).collect();
        known.insert(SHELL_UID);
        let purged = self.db.delete_stale_grants(&known).await?;
        self.db.delete_grant(self.identity.uid).await?;

        let mut records: HashMap<i64, GrantRecord> = self
            .db
            .list_grants()
            .await?
            .into_iter()
            .map(|record| (record.uid, record))
            .collect();

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(resolved.len() + 1);
        for item in resolved {
            if item.uid == self.identity.uid {
                continue;
            }
            // One entry per distinct uid; the first package encountered
            // supplies the metadata for a shared uid.
            if !seen.insert(item.uid) {
                continue;
            }
            let record = records.remove(&item.uid);
            entries.push(self.entry_for(item, record));
        }

        if !seen.contains(&SHELL_UID) {
            let record = records.remove(&SHELL_UID);
            entries.push(self.entry_for(shell_entry(), record));
        }

        entries.sort_by(presentation_order);

        info!(
            entries = entries.len(),
            purged, "Reconciliation pass complete"
        );

        Ok(entries)
    }

    /// Enumerate and resolve the installed inventory, skipping the engine's
    /// own package and any package whose metadata fails to resolve.
    async fn resolve_inventory(&self) -> Result<Vec<InventoryEntry>, ReconcileError> {
        let packages = self
            .inventory
            .list_packages()
            .await
            .map_err(|e| ReconcileError::Inventory(e.to_string()))?;

        let mut resolved = Vec::with_capacity(packages.len());
        for package in packages {
            if package == self.identity.package {
                continue;
            }
            match self.inventory.resolve(&package).await {
                Ok(item) => resolved.push(item),
                Err(e) => {
                    debug!(package, error = %e, "Skipping unresolvable package");
                }
            }
        }

        Ok(resolved)
    }

    fn entry_for(&self, item: InventoryEntry, record: Option<GrantRecord>) -> PolicyEntry {
        let (decision, notify, logging) = match record {
            Some(r) => (r.decision(), r.notify != 0, r.logging != 0),
            None => (Decision::Query, self.defaults.notify, self.defaults.logging),
        };

        PolicyEntry {
            uid: item.uid,
            package: item.package,
            label: item.label,
            icon: item.icon,
            shared_uid: item.shared_uid,
            decision,
            notify,
            logging,
        }
    }
}

/// Synthetic inventory entry for the distinguished shell subject.
fn shell_entry() -> InventoryEntry {
    InventoryEntry {
        package: SHELL_PACKAGE.to_string(),
        uid: SHELL_UID,
        shared_uid: false,
        label: SHELL_LABEL.to_string(),
        icon: None,
    }
}

/// Total presentation order: undecided entries after all decided ones,
/// allowed entries before the remaining decided ones, then case-insensitive
/// label, then package identifier.
fn presentation_order(a: &PolicyEntry, b: &PolicyEntry) -> Ordering {
    (a.decision == Decision::Query)
        .cmp(&(b.decision == Decision::Query))
        .then_with(|| (b.decision == Decision::Allow).cmp(&(a.decision == Decision::Allow)))
        .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
        .then_with(|| a.package.cmp(&b.package))
}
