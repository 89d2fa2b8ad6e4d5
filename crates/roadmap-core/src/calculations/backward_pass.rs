use crate::graph::schedule_dag::ScheduleDag;

/// Late dates by DAG position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackwardSchedule {
    pub latest_start: Vec<i64>,
    pub latest_finish: Vec<i64>,
}

pub struct BackwardPass<'a> {
    dag: &'a ScheduleDag,
}

impl<'a> BackwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag) -> Self {
        Self { dag }
    }

    pub fn execute(&self, order: &[usize], project_finish: i64) -> BackwardSchedule {
        let n = self.dag.len();
        let mut late_starts = vec![0; n];
        let mut late_finishes = vec![0; n];

        // Reverse topological order
        for &pos in order.iter().rev() {
            let node = self.dag.node(pos);

            // End-frontier tasks keep the project finish.
            let lf = node
                .successors
                .iter()
                .map(|link| {
                    link.kind.predecessor_finish_bound(
                        late_starts[link.node],
                        late_finishes[link.node],
                        link.lag_days,
                        node.duration,
                    )
                })
                .fold(project_finish, i64::min);

            late_finishes[pos] = lf;
            late_starts[pos] = lf - node.duration;
        }

        BackwardSchedule {
            latest_start: late_starts,
            latest_finish: late_finishes,
        }
    }
}
