use crate::graph::schedule_dag::ScheduleDag;

/// Rolled-up completion (0–100) by DAG position.
///
/// Leaves keep their stored percentage. A container reports the average of
/// its children weighted by duration, where a nested container weighs the
/// sum of its own children's weights. When every child weighs zero the
/// children count equally.
pub fn rollup(dag: &ScheduleDag) -> Vec<f64> {
    let n = dag.len();
    let children = dag.children();
    let mut completion = vec![0.0; n];
    let mut weight = vec![0i64; n];

    // Post-order over the containment forest.
    let mut stack: Vec<(usize, bool)> = (0..n)
        .rev()
        .filter(|pos| dag.node(*pos).parent.is_none())
        .map(|pos| (pos, false))
        .collect();
    while let Some((pos, expanded)) = stack.pop() {
        let kids = &children[pos];
        if kids.is_empty() {
            let node = dag.node(pos);
            completion[pos] = node.percent_complete;
            weight[pos] = node.duration;
            continue;
        }
        if !expanded {
            stack.push((pos, true));
            stack.extend(kids.iter().rev().map(|kid| (*kid, false)));
            continue;
        }

        let total: i64 = kids.iter().map(|kid| weight[*kid]).sum();
        completion[pos] = if total > 0 {
            kids.iter()
                .map(|kid| completion[*kid] * weight[*kid] as f64)
                .sum::<f64>()
                / total as f64
        } else {
            kids.iter().map(|kid| completion[*kid]).sum::<f64>() / kids.len() as f64
        };
        weight[pos] = total;
    }

    completion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn rolled(tasks: &[Task]) -> Vec<f64> {
        let refs: Vec<&Task> = tasks.iter().collect();
        rollup(&ScheduleDag::from_store_parts(&refs, &[]))
    }

    #[test]
    fn weights_by_duration() {
        let tasks = [
            Task::milestone(1, "M"),
            Task::new(2, "Short", 1).with_parent(1).with_progress(100.0),
            Task::new(3, "Long", 3).with_parent(1),
        ];
        assert_eq!(rolled(&tasks)[0], 25.0);
    }

    #[test]
    fn zero_duration_children_count_equally() {
        let tasks = [
            Task::milestone(1, "M"),
            Task::milestone(2, "Gate A").with_parent(1).with_progress(100.0),
            Task::milestone(3, "Gate B").with_parent(1),
        ];
        assert_eq!(rolled(&tasks)[0], 50.0);
    }

    #[test]
    fn nested_containers_carry_their_weight() {
        let tasks = [
            Task::milestone(1, "Root"),
            Task::milestone(2, "Phase").with_parent(1),
            Task::new(3, "P1", 3).with_parent(2).with_progress(100.0),
            Task::new(4, "P2", 3).with_parent(2).with_progress(100.0),
            Task::new(5, "Other", 2).with_parent(1),
        ];
        let completion = rolled(&tasks);
        assert_eq!(completion[1], 100.0);
        assert_eq!(completion[0], 75.0);
    }

    #[test]
    fn childless_milestone_keeps_own_percentage() {
        let tasks = [Task::milestone(1, "Solo").with_progress(40.0)];
        assert_eq!(rolled(&tasks), vec![40.0]);
    }
}
