use crate::calculations::backward_pass::BackwardSchedule;
use crate::calculations::forward_pass::ForwardSchedule;
use crate::graph::schedule_dag::{DagLink, ScheduleDag};
use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// Zero-slack part of the schedule.
///
/// `tasks` is in topological order, `edges` is every dependency between two
/// critical tasks, and `chains` lists each walk along tight critical edges
/// from a chain head to a chain tail. Parallel critical branches each get
/// their own chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub tasks: Vec<TaskId>,
    pub edges: Vec<(TaskId, TaskId)>,
    pub chains: Vec<Vec<TaskId>>,
}

impl CriticalPath {
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Slack by DAG position together with the critical path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlackAnalysis {
    pub total_slack: Vec<i64>,
    pub free_slack: Vec<i64>,
    pub critical: Vec<bool>,
    pub path: CriticalPath,
    pub project_start: i64,
    pub project_finish: i64,
}

impl SlackAnalysis {
    pub fn project_duration(&self) -> i64 {
        self.project_finish - self.project_start
    }
}

/// Slack, critical flags and the critical path for one computed schedule.
///
/// Total slack is `LS - driving_start`. It equals `LS - ES` unless an anchor
/// conflicts with the task's dependencies, in which case the reported ES is
/// earlier than the start its successors are driven by. Free slack is the
/// smallest gap between the task's own bound on a successor (lag included)
/// and that successor's start, clamped at zero and zero without successors.
pub fn analyze(
    dag: &ScheduleDag,
    order: &[usize],
    early: &ForwardSchedule,
    late: &BackwardSchedule,
) -> SlackAnalysis {
    let n = dag.len();
    let total_slack: Vec<i64> = (0..n)
        .map(|pos| late.latest_start[pos] - early.driving_start[pos])
        .collect();
    let critical: Vec<bool> = total_slack.iter().map(|slack| *slack == 0).collect();

    let free_slack: Vec<i64> = (0..n)
        .map(|pos| {
            dag.node(pos)
                .successors
                .iter()
                .map(|link| edge_gap(dag, early, pos, link))
                .min()
                .unwrap_or(0)
                .max(0)
        })
        .collect();

    // Over every task: an FF successor of an anchored root can start first.
    let project_start = early.earliest_start.iter().copied().min().unwrap_or(0);

    let path = critical_path(dag, order, early, &critical);

    SlackAnalysis {
        total_slack,
        free_slack,
        critical,
        path,
        project_start,
        project_finish: early.project_finish(),
    }
}

/// How far the successor's start sits past the bound this edge imposes.
fn edge_gap(dag: &ScheduleDag, early: &ForwardSchedule, pred: usize, link: &DagLink) -> i64 {
    let bound = link.kind.successor_start_bound(
        early.driving_start[pred],
        early.driving_finish[pred],
        link.lag_days,
        dag.node(link.node).duration,
    );
    early.driving_start[link.node] - bound
}

fn critical_path(
    dag: &ScheduleDag,
    order: &[usize],
    early: &ForwardSchedule,
    critical: &[bool],
) -> CriticalPath {
    let tasks: Vec<TaskId> = order
        .iter()
        .filter(|pos| critical[**pos])
        .map(|pos| dag.node(*pos).id)
        .collect();

    let mut edges = Vec::new();
    let mut tight: Vec<Vec<usize>> = vec![Vec::new(); dag.len()];
    let mut has_tight_pred = vec![false; dag.len()];
    for &pos in order.iter().filter(|pos| critical[**pos]) {
        for link in &dag.node(pos).successors {
            if !critical[link.node] {
                continue;
            }
            edges.push((dag.node(pos).id, dag.node(link.node).id));
            if edge_gap(dag, early, pos, link) == 0 {
                tight[pos].push(link.node);
                has_tight_pred[link.node] = true;
            }
        }
    }

    let mut chains = Vec::new();
    for &head in order
        .iter()
        .filter(|pos| critical[**pos] && !has_tight_pred[**pos])
    {
        // Depth-first walk; each stack entry is (node, next successor index).
        let mut walk: Vec<(usize, usize)> = vec![(head, 0)];
        while let Some(top) = walk.last_mut() {
            let pos = top.0;
            if tight[pos].is_empty() {
                chains.push(walk.iter().map(|(p, _)| dag.node(*p).id).collect());
                walk.pop();
            } else if top.1 < tight[pos].len() {
                let succ = tight[pos][top.1];
                top.1 += 1;
                walk.push((succ, 0));
            } else {
                walk.pop();
            }
        }
    }

    CriticalPath {
        tasks,
        edges,
        chains,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::backward_pass::BackwardPass;
    use crate::calculations::forward_pass::ForwardPass;
    use crate::dependency::{Dependency, DependencyKind};
    use crate::task::Task;

    fn run(tasks: &[Task], deps: &[Dependency]) -> SlackAnalysis {
        let refs: Vec<&Task> = tasks.iter().collect();
        let dag = ScheduleDag::from_store_parts(&refs, deps);
        let order = dag.topological_order();
        let early = ForwardPass::new(&dag).execute(&order);
        let late = BackwardPass::new(&dag).execute(&order, early.project_finish());
        analyze(&dag, &order, &early, &late)
    }

    #[test]
    fn diamond_reports_both_critical_branches() {
        let tasks = [
            Task::new(1, "A", 2),
            Task::new(2, "B", 3),
            Task::new(3, "C", 3),
            Task::new(4, "D", 1),
        ];
        let deps = [
            Dependency::finish_to_start(1, 2),
            Dependency::finish_to_start(1, 3),
            Dependency::finish_to_start(2, 4),
            Dependency::finish_to_start(3, 4),
        ];
        let analysis = run(&tasks, &deps);
        assert_eq!(analysis.path.tasks, vec![1, 2, 3, 4]);
        assert_eq!(analysis.path.chains, vec![vec![1, 2, 4], vec![1, 3, 4]]);
        assert_eq!(analysis.path.edges.len(), 4);
        assert_eq!(analysis.project_duration(), 6);
    }

    #[test]
    fn free_slack_is_gap_to_nearest_successor() {
        let tasks = [Task::new(1, "A", 1), Task::new(2, "B", 5), Task::new(3, "C", 1)];
        let deps = [Dependency::finish_to_start(1, 3), Dependency::finish_to_start(2, 3)];
        let analysis = run(&tasks, &deps);
        assert_eq!(analysis.free_slack, vec![4, 0, 0]);
        assert_eq!(analysis.total_slack, vec![4, 0, 0]);
        assert_eq!(analysis.path.chains, vec![vec![2, 3]]);
    }

    #[test]
    fn slack_accounts_for_lag_and_conflicting_anchors() {
        let tasks = [
            Task::new(1, "A", 1),
            Task::new(2, "B", 5),
            Task::new(3, "C", 1),
            Task::new(4, "D", 2).with_fixed_start(1),
        ];
        let deps = [
            Dependency::finish_to_start(1, 3).with_lag(2),
            Dependency::finish_to_start(2, 3),
            Dependency::finish_to_start(2, 4),
        ];
        let analysis = run(&tasks, &deps);
        // A's bound on C is 1 + 2, C starts at 5.
        assert_eq!(analysis.free_slack[0], 2);
        assert_eq!(analysis.total_slack[0], 3);
        // D reports ES 1 but is driven from 5.
        assert_eq!(analysis.total_slack[3], 0);
        assert!(analysis.critical[3]);
    }

    #[test]
    fn project_span_covers_tasks_that_start_before_every_root() {
        let tasks = [Task::new(1, "A", 1).with_fixed_start(5), Task::new(2, "B", 7)];
        let deps = [Dependency::finish_to_start(1, 2).with_kind(DependencyKind::FinishToFinish)];
        let analysis = run(&tasks, &deps);
        assert_eq!(analysis.project_start, 0);
        assert_eq!(analysis.project_finish, 7);
        assert_eq!(analysis.project_duration(), 7);
    }

    #[test]
    fn isolated_tasks_form_single_node_chains() {
        let tasks = [Task::new(1, "A", 3), Task::new(2, "B", 3)];
        let analysis = run(&tasks, &[]);
        assert_eq!(analysis.path.chains, vec![vec![1], vec![2]]);
        assert!(analysis.path.edges.is_empty());
    }

    #[test]
    fn empty_graph_has_zero_duration() {
        let analysis = run(&[], &[]);
        assert_eq!(analysis.project_duration(), 0);
        assert!(analysis.path.is_empty());
    }
}
