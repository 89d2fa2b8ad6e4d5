use crate::calculations::backward_pass::BackwardPass;
use crate::calculations::critical_path::{self, CriticalPath};
use crate::calculations::forward_pass::ForwardPass;
use crate::calculations::progress;
use crate::error::ScheduleConflict;
use crate::graph::schedule_dag::ScheduleDag;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Computed dates for one task, as working-day offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_start: i64,
    pub latest_finish: i64,
    /// Start handed to successors; differs from `earliest_start` only when
    /// the task's anchor conflicts with its dependencies.
    pub driving_start: i64,
    pub total_slack: i64,
    pub free_slack: i64,
    pub is_critical: bool,
}

/// Immutable result of one recompute. Replaced whole on every commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub revision: u64,
    pub order: Vec<TaskId>,
    pub entries: BTreeMap<TaskId, ScheduleEntry>,
    pub critical_path: CriticalPath,
    pub project_start: i64,
    pub project_finish: i64,
    pub project_duration: i64,
    pub progress: BTreeMap<TaskId, f64>,
    pub conflicts: Vec<ScheduleConflict>,
    /// Tasks with no children, in insertion order.
    #[serde(default)]
    pub leaves: Vec<TaskId>,
}

impl ScheduleSnapshot {
    pub fn entry(&self, id: TaskId) -> Option<&ScheduleEntry> {
        self.entries.get(&id)
    }

    pub fn progress(&self, id: TaskId) -> Option<f64> {
        self.progress.get(&id).copied()
    }

    pub fn conflict(&self, id: TaskId) -> Option<&ScheduleConflict> {
        self.conflicts.iter().find(|c| c.task_id == id)
    }

    pub fn task_count(&self) -> usize {
        self.entries.len()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("rev={}", self.revision));
        parts.push(format!("tasks={}", self.task_count()));
        parts.push(format!("critical={}", self.critical_path.tasks.len()));
        parts.push(format!("duration={}", self.project_duration));
        if !self.conflicts.is_empty() {
            parts.push(format!("conflicts={}", self.conflicts.len()));
        }
        if !self.critical_path.chains.is_empty() {
            let chains = self
                .critical_path
                .chains
                .iter()
                .map(|chain| {
                    chain
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("->")
                })
                .collect::<Vec<_>>()
                .join(" | ");
            parts.push(format!("crit_path={}", chains));
        }
        parts.join(", ")
    }
}

/// Run both passes, slack analysis and the progress roll-up over `dag`.
pub fn compute(dag: &ScheduleDag, revision: u64) -> ScheduleSnapshot {
    let started = Instant::now();
    let order = dag.topological_order();

    let early = ForwardPass::new(dag).execute(&order);
    let late = BackwardPass::new(dag).execute(&order, early.project_finish());
    let analysis = critical_path::analyze(dag, &order, &early, &late);
    let completion = progress::rollup(dag);
    let leaves = dag
        .children()
        .iter()
        .enumerate()
        .filter(|(_, children)| children.is_empty())
        .map(|(pos, _)| dag.node(pos).id)
        .collect();

    let mut entries = BTreeMap::new();
    let mut rolled = BTreeMap::new();
    for (pos, node) in dag.nodes().iter().enumerate() {
        entries.insert(
            node.id,
            ScheduleEntry {
                earliest_start: early.earliest_start[pos],
                earliest_finish: early.earliest_finish[pos],
                latest_start: late.latest_start[pos],
                latest_finish: late.latest_finish[pos],
                driving_start: early.driving_start[pos],
                total_slack: analysis.total_slack[pos],
                free_slack: analysis.free_slack[pos],
                is_critical: analysis.critical[pos],
            },
        );
        rolled.insert(node.id, completion[pos]);
    }

    for conflict in &early.conflicts {
        warn!(
            task = conflict.task_id,
            anchored_start = conflict.anchored_start,
            derived_start = conflict.derived_start,
            "manual anchor precedes dependency-derived start"
        );
    }

    let snapshot = ScheduleSnapshot {
        revision,
        order: order.iter().map(|pos| dag.node(*pos).id).collect(),
        entries,
        project_start: analysis.project_start,
        project_finish: analysis.project_finish,
        project_duration: analysis.project_duration(),
        critical_path: analysis.path,
        progress: rolled,
        conflicts: early.conflicts,
        leaves,
    };

    debug!(
        revision,
        tasks = snapshot.task_count(),
        critical = snapshot.critical_path.tasks.len(),
        duration = snapshot.project_duration,
        elapsed_us = started.elapsed().as_micros() as u64,
        "schedule recomputed"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::task::Task;

    #[test]
    fn entries_satisfy_duration_identities() {
        let tasks = [Task::new(1, "A", 3), Task::new(2, "B", 2), Task::new(3, "C", 4)];
        let deps = [Dependency::finish_to_start(1, 2), Dependency::finish_to_start(1, 3)];
        let refs: Vec<&Task> = tasks.iter().collect();
        let dag = ScheduleDag::from_store_parts(&refs, &deps);
        let snapshot = compute(&dag, 7);

        assert_eq!(snapshot.revision, 7);
        assert_eq!(snapshot.order, vec![1, 2, 3]);
        for task in &tasks {
            let entry = snapshot.entry(task.id).unwrap();
            assert_eq!(entry.earliest_finish, entry.earliest_start + task.duration_days);
            assert_eq!(entry.latest_start, entry.latest_finish - task.duration_days);
        }
        assert!(snapshot.to_cli_summary().contains("crit_path=1->3"));
    }
}
