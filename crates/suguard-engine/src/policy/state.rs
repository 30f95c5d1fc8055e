//! Live snapshot state for the reconciled policy list.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, watch};

use super::types::PolicyEntry;

/// Immutable view handed to the presentation adapter.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// The ordered policy list from the newest applied pass.
    pub entries: Arc<Vec<PolicyEntry>>,
    /// Whether a reconciliation pass is in flight.
    pub loading: bool,
}

/// State container publishing one live snapshot at a time.
///
/// Reconciliation passes are numbered; a pass result is applied only when no
/// newer pass has completed, so overlapping passes resolve last-started-wins
/// and a superseded result is discarded rather than presented.
pub struct PolicyState {
    tx: watch::Sender<Snapshot>,
    /// Number of passes started.
    started: AtomicU64,
    /// Highest pass number applied (success or failure).
    applied: Mutex<u64>,
}

impl PolicyState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self {
            tx,
            started: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// The currently-live snapshot.
    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Start a new pass: raises `loading` and returns the pass number.
    pub(crate) fn begin_pass(&self) -> u64 {
        let pass = self.started.fetch_add(1, Ordering::AcqRel) + 1;
        self.tx.send_modify(|snap| snap.loading = true);
        pass
    }

    /// Finish a pass. `Some(entries)` publishes a new list; `None` records a
    /// failed pass, retaining the previous entries. Returns `false` when the
    /// result was superseded by a newer completed pass and discarded.
    ///
    /// `loading` stays raised while a pass newer than this one is in flight.
    pub(crate) async fn complete(&self, pass: u64, entries: Option<Vec<PolicyEntry>>) -> bool {
        let mut applied = self.applied.lock().await;
        if pass <= *applied {
            return false;
        }
        *applied = pass;

        let newer_in_flight = self.started.load(Ordering::Acquire) > pass;
        self.tx.send_modify(|snap| {
            if let Some(list) = entries {
                snap.entries = Arc::new(list);
            }
            snap.loading = newer_in_flight;
        });
        true
    }
}

impl Default for PolicyState {
    fn default() -> Self {
        Self::new()
    }
}
