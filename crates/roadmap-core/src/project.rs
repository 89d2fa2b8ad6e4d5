use crate::calculations::critical_path::CriticalPath;
use crate::calculations::status::StatusSummary;
use crate::dependency::Dependency;
use crate::error::{EngineResult, ScheduleConflict};
use crate::graph::schedule_dag::ScheduleDag;
use crate::graph::store::GraphStore;
use crate::metadata::ProjectMetadata;
use crate::schedule::{ScheduleEntry, ScheduleSnapshot};
use crate::slot::SnapshotSlot;
use crate::task::{Task, TaskId, TaskUpdate};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecomputeMode {
    /// Recompute before the mutation returns.
    #[default]
    Inline,
    /// Recompute on the rayon pool; readers keep the previous snapshot
    /// until the new one is published.
    Background,
}

/// Outcome of an accepted mutation.
#[derive(Debug, Clone)]
pub enum Commit {
    Applied(Arc<ScheduleSnapshot>),
    Scheduled { revision: u64 },
}

impl Commit {
    pub fn revision(&self) -> u64 {
        match self {
            Commit::Applied(snapshot) => snapshot.revision,
            Commit::Scheduled { revision } => *revision,
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<ScheduleSnapshot>> {
        match self {
            Commit::Applied(snapshot) => Some(snapshot),
            Commit::Scheduled { .. } => None,
        }
    }
}

/// One roadmap: its graph, metadata and current schedule.
///
/// Edits go through the graph store first; a rejected edit returns the
/// error and leaves both the graph and the snapshot untouched.
#[derive(Debug)]
pub struct Project {
    metadata: ProjectMetadata,
    store: GraphStore,
    slot: Arc<SnapshotSlot>,
    mode: RecomputeMode,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(ProjectMetadata::default())
    }
}

impl Project {
    pub fn new(metadata: ProjectMetadata) -> Self {
        Self::from_parts(metadata, GraphStore::new())
    }

    /// Wrap an already-validated store and publish its first schedule.
    pub fn from_parts(metadata: ProjectMetadata, store: GraphStore) -> Self {
        let project = Self {
            metadata,
            store,
            slot: Arc::new(SnapshotSlot::new()),
            mode: RecomputeMode::Inline,
        };
        project.recompute_inline();
        project
    }

    pub fn with_mode(mut self, mode: RecomputeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RecomputeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RecomputeMode) {
        self.mode = mode;
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ProjectMetadata {
        &mut self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.store.task(id)
    }

    pub fn tasks(&self) -> Vec<&Task> {
        self.store.tasks()
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.store.dependencies()
    }

    pub fn dag(&self) -> ScheduleDag {
        self.store.to_dag()
    }

    pub fn next_task_id(&self) -> TaskId {
        self.store.next_task_id()
    }

    // Mutations

    pub fn add_task(&mut self, task: Task) -> EngineResult<Commit> {
        self.store.add_task(task)?;
        Ok(self.commit())
    }

    pub fn remove_task(&mut self, id: TaskId) -> EngineResult<Commit> {
        self.store.remove_task(id)?;
        Ok(self.commit())
    }

    pub fn update_task(&mut self, id: TaskId, update: &TaskUpdate) -> EngineResult<Commit> {
        self.store.update_task(id, update)?;
        Ok(self.commit())
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> EngineResult<Commit> {
        self.store.add_edge(dependency)?;
        Ok(self.commit())
    }

    pub fn remove_dependency(&mut self, predecessor: TaskId, successor: TaskId) -> EngineResult<Commit> {
        self.store.remove_edge(predecessor, successor)?;
        Ok(self.commit())
    }

    /// Recompute inline, settling any pending background work.
    pub fn flush(&self) -> Arc<ScheduleSnapshot> {
        self.recompute_inline()
    }

    // Queries; all read the last published snapshot.

    pub fn snapshot(&self) -> Arc<ScheduleSnapshot> {
        self.slot.load()
    }

    pub fn schedule(&self, id: TaskId) -> Option<ScheduleEntry> {
        self.slot.load().entry(id).copied()
    }

    pub fn critical_path(&self) -> CriticalPath {
        self.slot.load().critical_path.clone()
    }

    pub fn project_duration(&self) -> i64 {
        self.slot.load().project_duration
    }

    pub fn progress(&self, id: TaskId) -> Option<f64> {
        self.slot.load().progress(id)
    }

    pub fn conflicts(&self) -> Vec<ScheduleConflict> {
        self.slot.load().conflicts.clone()
    }

    /// Status counts over tasks that contain nothing, as of `as_of`. Reads
    /// only the published snapshot.
    pub fn status_summary(&self, as_of: i64) -> StatusSummary {
        let snapshot = self.slot.load();
        let leaves = snapshot
            .leaves
            .iter()
            .filter_map(|id| {
                let entry = snapshot.entry(*id)?;
                Some((snapshot.progress(*id)?, entry.earliest_finish))
            })
            .collect::<Vec<_>>();
        StatusSummary::tally(as_of, leaves)
    }

    pub fn subscribe(&self) -> Receiver<Arc<ScheduleSnapshot>> {
        self.slot.subscribe()
    }

    fn commit(&self) -> Commit {
        match self.mode {
            RecomputeMode::Inline => Commit::Applied(self.recompute_inline()),
            RecomputeMode::Background => {
                let ticket = self.slot.begin();
                let dag = self.store.to_dag();
                let slot = Arc::clone(&self.slot);
                debug!(ticket, "recompute scheduled");
                rayon::spawn(move || {
                    slot.recompute(&dag, ticket);
                });
                Commit::Scheduled { revision: ticket }
            }
        }
    }

    fn recompute_inline(&self) -> Arc<ScheduleSnapshot> {
        let ticket = self.slot.begin();
        let dag = self.store.to_dag();
        // Only a concurrent ticket can pre-empt this one; the caller still
        // gets whatever is current.
        self.slot
            .recompute(&dag, ticket)
            .unwrap_or_else(|| self.slot.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn rejected_edit_keeps_snapshot() {
        let mut project = Project::default();
        project.add_task(Task::new(1, "A", 3)).unwrap();
        let before = project.snapshot();
        let err = project.add_task(Task::new(2, "Bad", -4));
        assert!(matches!(err, Err(EngineError::InvalidDuration(_))));
        assert!(Arc::ptr_eq(&before, &project.snapshot()));
    }

    #[test]
    fn each_commit_bumps_revision() {
        let mut project = Project::default();
        let first = project.add_task(Task::new(1, "A", 1)).unwrap().revision();
        let second = project.add_task(Task::new(2, "B", 1)).unwrap().revision();
        assert!(second > first);
        assert_eq!(project.snapshot().revision, second);
    }

    #[test]
    fn status_summary_reads_leaves_from_the_published_snapshot() {
        let mut project = Project::default();
        project.add_task(Task::new(1, "Build", 4)).unwrap();
        project.add_task(Task::milestone(2, "Review")).unwrap();
        assert_eq!(project.snapshot().leaves, vec![1, 2]);

        // Edit the store without committing, as a pending background
        // recompute would leave it.
        project
            .store
            .add_task(Task::new(3, "Fix", 1).with_parent(2))
            .unwrap();
        let summary = project.status_summary(3);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.not_started, 1);
        assert_eq!(summary.overdue, 1);
    }
}
