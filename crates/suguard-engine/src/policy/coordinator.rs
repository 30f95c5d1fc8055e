//! Mutation coordinator.
//!
//! Applies grant/deny/revoke/flag mutations to the store, optionally behind a
//! re-authentication gate, and keeps the live snapshot consistent with the
//! store by forcing a reconciliation refresh after decision-changing writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};
use tracing::{debug, error, info, warn};

use suguard_core::config::SecurityConfig;

use crate::auth::Authenticator;
use crate::storage::{Database, Decision};

use super::reconciler::Reconciler;
use super::state::PolicyState;
use super::types::{Notice, PolicyEntry};

const NOTICE_CAPACITY: usize = 32;

/// Coordinates user-initiated mutations against the grant store.
pub struct MutationCoordinator {
    db: Database,
    reconciler: Arc<Reconciler>,
    state: Arc<PolicyState>,
    auth: Arc<dyn Authenticator>,
    security: SecurityConfig,
    notices: broadcast::Sender<Notice>,
    /// Per-uid write serialization: a grant and a revoke for the same subject
    /// must never interleave their store writes.
    subject_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl MutationCoordinator {
    pub fn new(
        db: Database,
        reconciler: Arc<Reconciler>,
        state: Arc<PolicyState>,
        auth: Arc<dyn Authenticator>,
        security: SecurityConfig,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            db,
            reconciler,
            state,
            auth,
            security,
            notices,
            subject_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to transient confirmation/error notices.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// The snapshot state this coordinator publishes to.
    pub fn state(&self) -> &Arc<PolicyState> {
        &self.state
    }

    /// Run a reconciliation pass and publish the result.
    ///
    /// On failure the previous snapshot stays live and a [`Notice::ReloadFailed`]
    /// is emitted. Overlapping refreshes resolve last-started-wins.
    pub async fn refresh(&self) {
        let pass = self.state.begin_pass();
        match self.reconciler.reconcile().await {
            Ok(entries) => {
                if !self.state.complete(pass, Some(entries)).await {
                    debug!(pass, "Discarding superseded reconciliation result");
                }
            }
            Err(e) => {
                warn!(error = %e, "Reconciliation pass failed; keeping previous list");
                self.state.complete(pass, None).await;
                self.emit(Notice::ReloadFailed);
            }
        }
    }

    /// Delete the grant record for an entry; it reappears undecided on the
    /// next pass.
    pub async fn revoke(&self, entry: &PolicyEntry) {
        if !self.gate().await {
            return;
        }

        let guard = self.subject_lock(entry.uid).await;
        let result = self.db.delete_grant(entry.uid).await;
        drop(guard);

        match result {
            Ok(_) => {
                info!(uid = entry.uid, "Grant revoked");
                self.emit(Notice::Revoked {
                    label: entry.label.clone(),
                });
                self.refresh().await;
            }
            Err(e) => self.report_failure(entry, &e),
        }
    }

    /// Delete every grant record; all subjects revert to undecided on the
    /// next pass.
    pub async fn revoke_all(&self) {
        if !self.gate().await {
            return;
        }

        match self.db.delete_all_grants().await {
            Ok(removed) => {
                info!(removed, "All grants revoked");
                self.emit(Notice::AllRevoked);
                self.refresh().await;
            }
            Err(e) => {
                error!(error = %e, "Bulk revoke failed");
                self.emit(Notice::MutationFailed { label: None });
            }
        }
    }

    /// Set the authorization decision for an entry.
    ///
    /// `Allow` (or greater) persists the record with that decision; anything
    /// below deletes the record entirely — deny is encoded as absence.
    pub async fn set_decision(&self, entry: &PolicyEntry, decision: Decision) {
        if !self.gate().await {
            return;
        }

        let allowed = decision >= Decision::Allow;
        let guard = self.subject_lock(entry.uid).await;
        let result = if allowed {
            self.db
                .upsert_grant(entry.uid, decision, entry.notify, entry.logging)
                .await
        } else {
            self.db.delete_grant(entry.uid).await.map(|_| ())
        };
        drop(guard);

        match result {
            Ok(()) => {
                info!(uid = entry.uid, %decision, "Decision updated");
                let label = entry.label.clone();
                self.emit(if allowed {
                    Notice::Granted { label }
                } else {
                    Notice::Denied { label }
                });
                self.refresh().await;
            }
            Err(e) => self.report_failure(entry, &e),
        }
    }

    /// Set the notify flag; the decision is written back unchanged.
    pub async fn set_notify(&self, entry: &PolicyEntry, enabled: bool) {
        if !self.gate().await {
            return;
        }

        let guard = self.subject_lock(entry.uid).await;
        let result = self
            .db
            .upsert_grant(entry.uid, entry.decision, enabled, entry.logging)
            .await;
        drop(guard);

        match result {
            Ok(()) => {
                info!(uid = entry.uid, enabled, "Notify flag updated");
                self.emit(Notice::NotifyChanged {
                    label: entry.label.clone(),
                    enabled,
                });
            }
            Err(e) => self.report_failure(entry, &e),
        }
    }

    /// Set the logging flag; the decision is written back unchanged.
    pub async fn set_logging(&self, entry: &PolicyEntry, enabled: bool) {
        if !self.gate().await {
            return;
        }

        let guard = self.subject_lock(entry.uid).await;
        let result = self
            .db
            .upsert_grant(entry.uid, entry.decision, entry.notify, enabled)
            .await;
        drop(guard);

        match result {
            Ok(()) => {
                info!(uid = entry.uid, enabled, "Logging flag updated");
                self.emit(Notice::LoggingChanged {
                    label: entry.label.clone(),
                    enabled,
                });
            }
            Err(e) => self.report_failure(entry, &e),
        }
    }

    /// Run the re-authentication gate. A declined challenge is a silent
    /// no-op, not an error.
    async fn gate(&self) -> bool {
        if !self.security.require_reauth {
            return true;
        }
        let passed = self.auth.challenge().await;
        if !passed {
            debug!("Re-authentication declined; mutation skipped");
        }
        passed
    }

    async fn subject_lock(&self, uid: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.subject_locks.lock().await;
            locks
                .entry(uid)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// A failed store write keeps the stale list displayed: the mutation did
    /// not take effect, so no refresh runs.
    fn report_failure(&self, entry: &PolicyEntry, e: &crate::storage::DatabaseError) {
        error!(uid = entry.uid, error = %e, "Grant mutation failed");
        self.emit(Notice::MutationFailed {
            label: Some(entry.label.clone()),
        });
    }

    fn emit(&self, notice: Notice) {
        // No subscribers is fine; notices are fire-and-forget.
        let _ = self.notices.send(notice);
    }
}
