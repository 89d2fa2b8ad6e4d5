use proptest::prelude::*;
use roadmap_engine::{Dependency, DependencyKind, EngineError, Project, Task, TaskUpdate};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
struct Plan {
    durations: Vec<i64>,
    anchors: Vec<Option<i64>>,
    edges: Vec<Dependency>,
}

impl Plan {
    fn build(&self) -> Project {
        let mut project = Project::default();
        for (idx, (duration, anchor)) in self.durations.iter().zip(&self.anchors).enumerate() {
            let id = idx as i32 + 1;
            let mut task = Task::new(id, format!("task_{id}"), *duration);
            task.fixed_start = *anchor;
            project.add_task(task).unwrap();
        }
        for edge in &self.edges {
            project.add_dependency(*edge).unwrap();
        }
        project
    }

    fn without_anchors(&self) -> Plan {
        Plan {
            anchors: vec![None; self.durations.len()],
            ..self.clone()
        }
    }
}

/// Whether `to` is reachable from `from` over `edges`.
fn reaches(edges: &[(usize, usize)], from: usize, to: usize) -> bool {
    let mut stack = vec![from];
    let mut seen = BTreeSet::new();
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if seen.insert(node) {
            stack.extend(edges.iter().filter(|(a, _)| *a == node).map(|(_, b)| *b));
        }
    }
    false
}

fn kind_strategy() -> impl Strategy<Value = DependencyKind> {
    prop_oneof![
        4 => Just(DependencyKind::FinishToStart),
        1 => Just(DependencyKind::StartToStart),
        1 => Just(DependencyKind::FinishToFinish),
    ]
}

// Acyclic by construction: edges only run from a lower index to a higher one.
fn plan_strategy(max_tasks: usize) -> impl Strategy<Value = Plan> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let durations = proptest::collection::vec(0i64..8, num_tasks);
        let anchors =
            proptest::collection::vec(proptest::option::weighted(0.25, 0i64..15), num_tasks);
        let raw_edges = proptest::collection::vec(
            (any::<usize>(), any::<usize>(), kind_strategy(), 0i64..3),
            0..num_tasks * 2,
        );
        (durations, anchors, raw_edges).prop_map(move |(durations, anchors, raw_edges)| {
            let mut seen = BTreeSet::new();
            let mut edges = Vec::new();
            for (a, b, kind, lag) in raw_edges {
                let (a, b) = (a % num_tasks, b % num_tasks);
                let (pred, succ) = match a.cmp(&b) {
                    std::cmp::Ordering::Less => (a, b),
                    std::cmp::Ordering::Greater => (b, a),
                    std::cmp::Ordering::Equal => continue,
                };
                if seen.insert((pred, succ)) {
                    edges.push(
                        Dependency::finish_to_start(pred as i32 + 1, succ as i32 + 1)
                            .with_kind(kind)
                            .with_lag(lag),
                    );
                }
            }
            Plan {
                durations,
                anchors,
                edges,
            }
        })
    })
}

proptest! {
    #[test]
    fn order_respects_every_edge(plan in plan_strategy(12)) {
        let project = plan.build();
        let snapshot = project.snapshot();
        let position: HashMap<i32, usize> = snapshot
            .order
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();
        prop_assert_eq!(snapshot.order.len(), plan.durations.len());
        for dep in project.dependencies() {
            prop_assert!(position[&dep.predecessor] < position[&dep.successor]);
        }
    }

    #[test]
    fn date_identities_hold(plan in plan_strategy(12)) {
        let project = plan.build();
        let snapshot = project.snapshot();
        for task in project.tasks() {
            let entry = snapshot.entry(task.id).unwrap();
            prop_assert_eq!(entry.earliest_finish - entry.earliest_start, task.duration_days);
            prop_assert_eq!(entry.latest_finish - entry.latest_start, task.duration_days);
            prop_assert!(entry.earliest_start >= 0);
            prop_assert!(entry.total_slack >= 0);
            prop_assert!(entry.free_slack >= 0);
            prop_assert!(entry.latest_finish <= snapshot.project_finish);
            prop_assert_eq!(entry.is_critical, entry.total_slack == 0);
            prop_assert_eq!(
                snapshot.critical_path.contains(task.id),
                entry.is_critical
            );
            match snapshot.conflict(task.id) {
                Some(conflict) => {
                    prop_assert_eq!(Some(conflict.anchored_start), task.fixed_start);
                    prop_assert_eq!(entry.earliest_start, conflict.anchored_start);
                    prop_assert_eq!(entry.driving_start, conflict.derived_start);
                    prop_assert!(entry.driving_start > entry.earliest_start);
                }
                None => prop_assert_eq!(entry.driving_start, entry.earliest_start),
            }
        }
        prop_assert!(!snapshot.critical_path.is_empty());
        prop_assert!(snapshot.project_duration >= *plan.durations.iter().max().unwrap());
    }

    #[test]
    fn chains_walk_critical_edges(plan in plan_strategy(12)) {
        let project = plan.build();
        let path = project.critical_path();
        for chain in &path.chains {
            prop_assert!(!chain.is_empty());
            for pair in chain.windows(2) {
                prop_assert!(path.edges.contains(&(pair[0], pair[1])));
            }
        }
    }

    #[test]
    fn adding_an_edge_never_shortens(plan in plan_strategy(10), a in any::<usize>(), b in any::<usize>()) {
        let n = plan.durations.len();
        prop_assume!(n >= 2);
        let (a, b) = (a % n, b % n);
        prop_assume!(a != b);
        let (pred, succ) = (a.min(b) as i32 + 1, a.max(b) as i32 + 1);

        let mut project = plan.without_anchors().build();
        let before = project.project_duration();
        match project.add_dependency(Dependency::finish_to_start(pred, succ)) {
            Ok(_) => prop_assert!(project.project_duration() >= before),
            Err(err) => prop_assert!(matches!(err, EngineError::DuplicateEdge { .. }), "unexpected error {:?}", err),
        }
    }

    #[test]
    fn removing_a_critical_edge_never_lengthens(plan in plan_strategy(10)) {
        let mut project = plan.without_anchors().build();
        let before = project.project_duration();
        let critical_edges = project.critical_path().edges;
        prop_assume!(!critical_edges.is_empty());
        let (pred, succ) = critical_edges[0];
        project.remove_dependency(pred, succ).unwrap();
        prop_assert!(project.project_duration() <= before);
    }

    #[test]
    fn back_edges_are_always_rejected(plan in plan_strategy(10)) {
        let mut project = plan.build();
        let before = project.snapshot();
        let deps = project.dependencies();
        for dep in &deps {
            let reversed = Dependency::finish_to_start(dep.successor, dep.predecessor);
            let is_cycle = matches!(
                project.add_dependency(reversed),
                Err(EngineError::Cycle { .. })
            );
            prop_assert!(is_cycle);
        }
        prop_assert_eq!(project.dependencies(), deps);
        prop_assert_eq!(project.snapshot().revision, before.revision);
    }

    #[test]
    fn recompute_is_idempotent(plan in plan_strategy(12)) {
        let project = plan.build();
        let first = project.snapshot();
        let second = project.flush();
        prop_assert_eq!(&first.order, &second.order);
        prop_assert_eq!(&first.entries, &second.entries);
        prop_assert_eq!(&first.critical_path, &second.critical_path);
        prop_assert_eq!(first.project_duration, second.project_duration);
    }

    #[test]
    fn dropping_every_anchor_clears_all_conflicts(plan in plan_strategy(12)) {
        let mut project = plan.build();
        for (idx, anchor) in plan.anchors.iter().enumerate() {
            if anchor.is_some() {
                project
                    .update_task(idx as i32 + 1, &TaskUpdate::fixed_start(None))
                    .unwrap();
            }
        }
        prop_assert!(project.conflicts().is_empty());
        let plain = plan.without_anchors().build();
        prop_assert_eq!(&project.snapshot().entries, &plain.snapshot().entries);
    }

    #[test]
    fn random_direction_edges_keep_the_graph_acyclic(
        durations in proptest::collection::vec(0i64..8, 2..12),
        pairs in proptest::collection::vec((any::<usize>(), any::<usize>()), 0..40),
    ) {
        let n = durations.len();
        let mut project = Project::default();
        for (idx, duration) in durations.iter().enumerate() {
            let id = idx as i32 + 1;
            project.add_task(Task::new(id, format!("task_{id}"), *duration)).unwrap();
        }

        let attempts = pairs.len();
        let mut accepted: Vec<(usize, usize)> = Vec::new();
        let (mut cycles, mut other_rejections) = (0usize, 0usize);
        for (a, b) in pairs {
            let (a, b) = (a % n, b % n);
            let closes_loop = reaches(&accepted, b, a);
            let result = project.add_dependency(Dependency::finish_to_start(a as i32 + 1, b as i32 + 1));
            match result {
                Ok(_) => {
                    prop_assert!(!closes_loop);
                    accepted.push((a, b));
                }
                Err(EngineError::Cycle { .. }) => {
                    prop_assert!(closes_loop && a != b);
                    cycles += 1;
                }
                Err(EngineError::InvalidEdge(_)) => {
                    prop_assert_eq!(a, b);
                    other_rejections += 1;
                }
                Err(EngineError::DuplicateEdge { .. }) => {
                    prop_assert!(accepted.contains(&(a, b)));
                    other_rejections += 1;
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        let snapshot = project.snapshot();
        prop_assert_eq!(project.dependencies().len(), accepted.len());
        prop_assert_eq!(snapshot.order.len(), n);
        let position: HashMap<i32, usize> = snapshot
            .order
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();
        for (a, b) in &accepted {
            prop_assert!(position[&(*a as i32 + 1)] < position[&(*b as i32 + 1)]);
        }
        prop_assert_eq!(accepted.len() + cycles + other_rejections, attempts);
        // Rejected edits never commit.
        prop_assert_eq!(snapshot.revision, (1 + n + accepted.len()) as u64);
    }
}
