use crate::graph::schedule_dag::ScheduleDag;
use crate::schedule::{self, ScheduleSnapshot};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

/// Holds the current snapshot for one project.
///
/// Writers take a generation ticket with [`SnapshotSlot::begin`]; a result is
/// only published while its ticket is still the newest one, so an older
/// recompute finishing late never overwrites a newer one.
#[derive(Debug)]
pub struct SnapshotSlot {
    current: RwLock<Arc<ScheduleSnapshot>>,
    generation: AtomicU64,
    subscribers: Mutex<Vec<Sender<Arc<ScheduleSnapshot>>>>,
}

impl Default for SnapshotSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ScheduleSnapshot::default())),
            generation: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn load(&self) -> Arc<ScheduleSnapshot> {
        self.current.read().clone()
    }

    /// Claim the next generation, invalidating every outstanding ticket.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation() == ticket
    }

    /// Swap in `snapshot` if its revision is still the newest ticket.
    /// Returns whether it was published.
    pub fn publish(&self, snapshot: ScheduleSnapshot) -> bool {
        let snapshot = Arc::new(snapshot);
        {
            let mut current = self.current.write();
            if !self.is_current(snapshot.revision) {
                debug!(
                    revision = snapshot.revision,
                    generation = self.generation(),
                    "discarding stale schedule"
                );
                return false;
            }
            *current = snapshot.clone();
            // Sent under the write lock so subscribers see revisions in order.
            self.notify(&snapshot);
        }
        true
    }

    /// Compute under `ticket` and publish, skipping the work when a newer
    /// ticket already exists.
    pub fn recompute(&self, dag: &ScheduleDag, ticket: u64) -> Option<Arc<ScheduleSnapshot>> {
        if !self.is_current(ticket) {
            debug!(ticket, "skipping superseded recompute");
            return None;
        }
        let snapshot = schedule::compute(dag, ticket);
        if self.publish(snapshot) {
            Some(self.load())
        } else {
            None
        }
    }

    /// Channel receiving every snapshot published from now on.
    pub fn subscribe(&self) -> Receiver<Arc<ScheduleSnapshot>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    fn notify(&self, snapshot: &Arc<ScheduleSnapshot>) {
        // Dropped receivers are pruned here.
        self.subscribers
            .lock()
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}
