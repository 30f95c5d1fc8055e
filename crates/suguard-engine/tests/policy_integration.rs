#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the policy engine.
//!
//! Tests the full flow: inventory + store reconciliation → ordered snapshot →
//! mutations → store consistency on the following pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use suguard_core::config::{GrantDefaults, SecurityConfig};
use suguard_engine::auth::{Authenticator, NoChallenge};
use suguard_engine::inventory::{InventoryEntry, InventoryError, InventoryProvider};
use suguard_engine::policy::{
    Decision, EngineIdentity, MutationCoordinator, Notice, PolicyEntry, PolicyState, Reconciler,
    SHELL_UID,
};
use suguard_engine::storage::Database;

/// Fixed in-memory inventory.
struct FakeInventory {
    entries: Vec<InventoryEntry>,
}

#[async_trait]
impl InventoryProvider for FakeInventory {
    async fn list_packages(&self) -> Result<Vec<String>, InventoryError> {
        Ok(self.entries.iter().map(|e| e.package.clone()).collect())
    }

    async fn resolve(&self, package: &str) -> Result<InventoryEntry, InventoryError> {
        self.entries
            .iter()
            .find(|e| e.package == package)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(package.to_string()))
    }
}

/// Authenticator whose outcome is flipped by tests.
struct FlagAuthenticator {
    accept: AtomicBool,
}

#[async_trait]
impl Authenticator for FlagAuthenticator {
    async fn challenge(&self) -> bool {
        self.accept.load(Ordering::Acquire)
    }
}

fn inv(package: &str, uid: i64, label: &str) -> InventoryEntry {
    InventoryEntry {
        package: package.to_string(),
        uid,
        shared_uid: false,
        label: label.to_string(),
        icon: None,
    }
}

const OWN_UID: i64 = 1000;

/// Build a coordinator over an in-memory store and the given inventory.
fn coordinator(
    db: Database,
    entries: Vec<InventoryEntry>,
    auth: Arc<dyn Authenticator>,
    require_reauth: bool,
) -> MutationCoordinator {
    let reconciler = Arc::new(Reconciler::new(
        db.clone(),
        Arc::new(FakeInventory { entries }),
        EngineIdentity {
            uid: OWN_UID,
            package: "dev.suguard.manager".to_string(),
        },
        GrantDefaults::default(),
    ));
    MutationCoordinator::new(
        db,
        reconciler,
        Arc::new(PolicyState::new()),
        auth,
        SecurityConfig { require_reauth },
    )
}

fn alpha_beta() -> Vec<InventoryEntry> {
    vec![
        inv("com.a", 10001, "Alpha"),
        inv("com.b", 10002, "Beta"),
    ]
}

fn snapshot_entries(coord: &MutationCoordinator) -> Vec<PolicyEntry> {
    coord.state().current().entries.as_ref().clone()
}

fn entry_for(coord: &MutationCoordinator, uid: i64) -> PolicyEntry {
    snapshot_entries(coord)
        .into_iter()
        .find(|e| e.uid == uid)
        .unwrap()
}

#[tokio::test]
async fn empty_store_yields_query_entries_in_name_order() {
    let db = Database::open_in_memory().await.unwrap();
    let coord = coordinator(db, alpha_beta(), Arc::new(NoChallenge), false);

    coord.refresh().await;

    let labels: Vec<String> = snapshot_entries(&coord)
        .iter()
        .map(|e| e.label.clone())
        .collect();
    assert_eq!(labels, ["Alpha", "Beta", "Shell"]);
    assert!(
        snapshot_entries(&coord)
            .iter()
            .all(|e| e.decision == Decision::Query)
    );
}

#[tokio::test]
async fn allowed_entry_sorts_before_undecided() {
    let db = Database::open_in_memory().await.unwrap();
    db.upsert_grant(10002, Decision::Allow, true, true)
        .await
        .unwrap();
    let coord = coordinator(db, alpha_beta(), Arc::new(NoChallenge), false);

    coord.refresh().await;

    let labels: Vec<String> = snapshot_entries(&coord)
        .iter()
        .map(|e| e.label.clone())
        .collect();
    assert_eq!(labels, ["Beta", "Alpha", "Shell"]);
    assert_eq!(entry_for(&coord, 10002).decision, Decision::Allow);
}

#[tokio::test]
async fn back_to_back_refreshes_are_identical() {
    let db = Database::open_in_memory().await.unwrap();
    db.upsert_grant(10001, Decision::Allow, false, true)
        .await
        .unwrap();
    let coord = coordinator(db, alpha_beta(), Arc::new(NoChallenge), false);

    coord.refresh().await;
    let first = snapshot_entries(&coord);
    coord.refresh().await;
    let second = snapshot_entries(&coord);

    assert_eq!(first, second);
}

#[tokio::test]
async fn shell_is_present_with_empty_inventory_and_store() {
    let db = Database::open_in_memory().await.unwrap();
    let coord = coordinator(db, Vec::new(), Arc::new(NoChallenge), false);

    coord.refresh().await;

    let entries = snapshot_entries(&coord);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uid, SHELL_UID);
    assert_eq!(entries[0].decision, Decision::Query);
}

#[tokio::test]
async fn stale_records_are_purged_except_shell() {
    let db = Database::open_in_memory().await.unwrap();
    db.upsert_grant(99999, Decision::Allow, true, true)
        .await
        .unwrap();
    db.upsert_grant(SHELL_UID, Decision::Allow, true, true)
        .await
        .unwrap();
    let coord = coordinator(db.clone(), alpha_beta(), Arc::new(NoChallenge), false);

    coord.refresh().await;

    let uids: Vec<i64> = db
        .list_grants()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.uid)
        .collect();
    assert!(!uids.contains(&99999));
    assert!(uids.contains(&SHELL_UID));
    assert_eq!(entry_for(&coord, SHELL_UID).decision, Decision::Allow);
}

#[tokio::test]
async fn deny_is_absence_and_resynthesizes_as_query() {
    let db = Database::open_in_memory().await.unwrap();
    let coord = coordinator(db.clone(), alpha_beta(), Arc::new(NoChallenge), false);
    coord.refresh().await;

    let beta = entry_for(&coord, 10002);
    coord.set_decision(&beta, Decision::Allow).await;
    assert_eq!(entry_for(&coord, 10002).decision, Decision::Allow);

    let beta = entry_for(&coord, 10002);
    coord.set_decision(&beta, Decision::Deny).await;

    // Deny is stored as absence, and the next pass presents the subject as
    // undecided again.
    assert!(db.get_grant(10002).await.unwrap().is_none());
    assert_eq!(entry_for(&coord, 10002).decision, Decision::Query);
}

#[tokio::test]
async fn revoke_resets_entry_to_query_default() {
    let db = Database::open_in_memory().await.unwrap();
    db.upsert_grant(10002, Decision::Allow, false, false)
        .await
        .unwrap();
    let coord = coordinator(db.clone(), alpha_beta(), Arc::new(NoChallenge), false);
    coord.refresh().await;

    let beta = entry_for(&coord, 10002);
    coord.revoke(&beta).await;

    assert!(db.get_grant(10002).await.unwrap().is_none());
    let beta = entry_for(&coord, 10002);
    assert_eq!(beta.decision, Decision::Query);
    // Default flags come back once the explicit record is gone.
    assert!(beta.notify);
    assert!(beta.logging);
}

#[tokio::test]
async fn set_notify_persists_flag_with_decision_unchanged() {
    let db = Database::open_in_memory().await.unwrap();
    db.upsert_grant(10002, Decision::Allow, false, true)
        .await
        .unwrap();
    let coord = coordinator(db.clone(), alpha_beta(), Arc::new(NoChallenge), false);
    coord.refresh().await;

    let beta = entry_for(&coord, 10002);
    coord.set_notify(&beta, true).await;

    let grant = db.get_grant(10002).await.unwrap().unwrap();
    assert_eq!(grant.decision(), Decision::Allow);
    assert_eq!(grant.notify, 1);
    assert_eq!(grant.logging, 1);
}

#[tokio::test]
async fn flag_toggle_persists_a_query_entry() {
    let db = Database::open_in_memory().await.unwrap();
    let coord = coordinator(db.clone(), alpha_beta(), Arc::new(NoChallenge), false);
    coord.refresh().await;

    // Explicit non-default configuration persists even without a decision.
    let alpha = entry_for(&coord, 10001);
    coord.set_logging(&alpha, false).await;

    let grant = db.get_grant(10001).await.unwrap().unwrap();
    assert_eq!(grant.decision(), Decision::Query);
    assert_eq!(grant.logging, 0);
}

#[tokio::test]
async fn revoke_all_clears_every_record() {
    let db = Database::open_in_memory().await.unwrap();
    db.upsert_grant(10001, Decision::Allow, true, true)
        .await
        .unwrap();
    db.upsert_grant(10002, Decision::Allow, false, false)
        .await
        .unwrap();
    let coord = coordinator(db.clone(), alpha_beta(), Arc::new(NoChallenge), false);
    coord.refresh().await;
    let mut notices = coord.subscribe_notices();

    coord.revoke_all().await;

    assert_eq!(notices.recv().await.unwrap(), Notice::AllRevoked);
    assert!(db.list_grants().await.unwrap().is_empty());
    assert!(
        snapshot_entries(&coord)
            .iter()
            .all(|e| e.decision == Decision::Query)
    );
}

#[tokio::test]
async fn gate_blocks_until_challenge_succeeds() {
    let db = Database::open_in_memory().await.unwrap();
    let auth = Arc::new(FlagAuthenticator {
        accept: AtomicBool::new(false),
    });
    let coord = coordinator(db.clone(), alpha_beta(), auth.clone(), true);
    coord.refresh().await;

    let beta = entry_for(&coord, 10002);
    coord.set_decision(&beta, Decision::Allow).await;
    assert!(db.get_grant(10002).await.unwrap().is_none());

    auth.accept.store(true, Ordering::Release);
    coord.set_decision(&beta, Decision::Allow).await;
    assert_eq!(
        db.get_grant(10002).await.unwrap().unwrap().decision(),
        Decision::Allow
    );
}

#[tokio::test]
async fn mutation_notices_fan_out_in_order() {
    let db = Database::open_in_memory().await.unwrap();
    let coord = coordinator(db, alpha_beta(), Arc::new(NoChallenge), false);
    coord.refresh().await;
    let mut notices = coord.subscribe_notices();

    let beta = entry_for(&coord, 10002);
    coord.set_decision(&beta, Decision::Allow).await;
    let beta = entry_for(&coord, 10002);
    coord.set_notify(&beta, false).await;
    let beta = entry_for(&coord, 10002);
    coord.revoke(&beta).await;

    assert_eq!(
        notices.recv().await.unwrap(),
        Notice::Granted {
            label: "Beta".to_string()
        }
    );
    assert_eq!(
        notices.recv().await.unwrap(),
        Notice::NotifyChanged {
            label: "Beta".to_string(),
            enabled: false
        }
    );
    assert_eq!(
        notices.recv().await.unwrap(),
        Notice::Revoked {
            label: "Beta".to_string()
        }
    );
}
