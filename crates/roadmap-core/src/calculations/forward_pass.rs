use crate::error::ScheduleConflict;
use crate::graph::schedule_dag::ScheduleDag;

/// Early dates by DAG position.
///
/// `earliest_*` are the reported dates. `driving_*` are what successors
/// see; they differ only for tasks whose anchor undercuts the dependency
/// bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardSchedule {
    pub earliest_start: Vec<i64>,
    pub earliest_finish: Vec<i64>,
    pub driving_start: Vec<i64>,
    pub driving_finish: Vec<i64>,
    pub conflicts: Vec<ScheduleConflict>,
}

impl ForwardSchedule {
    /// Latest driving finish across the project, 0 when empty.
    pub fn project_finish(&self) -> i64 {
        self.driving_finish.iter().copied().max().unwrap_or(0)
    }
}

pub struct ForwardPass<'a> {
    dag: &'a ScheduleDag,
}

impl<'a> ForwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag) -> Self {
        Self { dag }
    }

    pub fn execute(&self, order: &[usize]) -> ForwardSchedule {
        let n = self.dag.len();
        let mut out = ForwardSchedule {
            earliest_start: vec![0; n],
            earliest_finish: vec![0; n],
            driving_start: vec![0; n],
            driving_finish: vec![0; n],
            conflicts: Vec::new(),
        };

        for &pos in order {
            let node = self.dag.node(pos);
            let derived = node
                .predecessors
                .iter()
                .map(|link| {
                    link.kind.successor_start_bound(
                        out.driving_start[link.node],
                        out.driving_finish[link.node],
                        link.lag_days,
                        node.duration,
                    )
                })
                .fold(0, i64::max);

            let (reported, driving) = match node.anchored_start {
                None => (derived, derived),
                Some(anchor) if anchor >= derived => (anchor, anchor),
                Some(anchor) => {
                    out.conflicts.push(ScheduleConflict {
                        task_id: node.id,
                        anchored_start: anchor,
                        derived_start: derived,
                    });
                    (anchor, derived)
                }
            };

            out.earliest_start[pos] = reported;
            out.earliest_finish[pos] = reported + node.duration;
            out.driving_start[pos] = driving;
            out.driving_finish[pos] = driving + node.duration;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::task::Task;

    #[test]
    fn late_anchor_is_propagated() {
        let a = Task::new(1, "A", 2);
        let b = Task::new(2, "B", 1).with_fixed_start(6);
        let c = Task::new(3, "C", 1);
        let deps = [Dependency::finish_to_start(1, 2), Dependency::finish_to_start(2, 3)];
        let dag = ScheduleDag::from_store_parts(&[&a, &b, &c], &deps);
        let fwd = ForwardPass::new(&dag).execute(&dag.topological_order());
        assert_eq!(fwd.earliest_start, vec![0, 6, 7]);
        assert!(fwd.conflicts.is_empty());
        assert_eq!(fwd.project_finish(), 8);
    }

    #[test]
    fn early_anchor_is_reported_but_not_propagated() {
        let a = Task::new(1, "A", 5);
        let d = Task::new(2, "D", 2).with_fixed_start(1);
        let e = Task::new(3, "E", 1);
        let deps = [Dependency::finish_to_start(1, 2), Dependency::finish_to_start(2, 3)];
        let dag = ScheduleDag::from_store_parts(&[&a, &d, &e], &deps);
        let fwd = ForwardPass::new(&dag).execute(&dag.topological_order());
        assert_eq!(fwd.earliest_start[1], 1);
        assert_eq!(fwd.earliest_finish[1], 3);
        assert_eq!(fwd.driving_finish[1], 7);
        assert_eq!(fwd.earliest_start[2], 7);
        assert_eq!(fwd.conflicts.len(), 1);
        assert_eq!(fwd.conflicts[0].shortfall(), 4);
    }
}
