use proptest::prelude::*;
use roadmap_engine::{Project, Task, TaskUpdate};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
struct Outline {
    // Parent slot for milestones 2..; slot 0 means top level.
    milestone_parents: Vec<usize>,
    // (parent slot, duration, percent) for each leaf task.
    leaves: Vec<(usize, i64, u8)>,
}

impl Outline {
    fn milestone_count(&self) -> usize {
        self.milestone_parents.len() + 1
    }

    fn leaf_id(&self, idx: usize) -> i32 {
        (self.milestone_count() + idx + 1) as i32
    }

    fn build(&self) -> Project {
        let mut project = Project::default();
        project.add_task(Task::milestone(1, "m1")).unwrap();
        for (idx, raw_parent) in self.milestone_parents.iter().enumerate() {
            let id = idx as i32 + 2;
            let mut task = Task::milestone(id, format!("m{id}"));
            // Parents always come from already inserted milestones.
            let parent = raw_parent % (idx + 2);
            if parent > 0 {
                task = task.with_parent(parent as i32);
            }
            project.add_task(task).unwrap();
        }
        let milestones = self.milestone_count();
        for (idx, (raw_parent, duration, pct)) in self.leaves.iter().enumerate() {
            let id = self.leaf_id(idx);
            let mut task = Task::new(id, format!("t{id}"), *duration).with_progress(f64::from(*pct));
            let parent = raw_parent % (milestones + 1);
            if parent > 0 {
                task = task.with_parent(parent as i32);
            }
            project.add_task(task).unwrap();
        }
        project
    }
}

fn outline_strategy() -> impl Strategy<Value = Outline> {
    (
        proptest::collection::vec(any::<usize>(), 0..5),
        proptest::collection::vec((any::<usize>(), 0i64..6, 0u8..=100), 1..12),
    )
        .prop_map(|(milestone_parents, leaves)| Outline {
            milestone_parents,
            leaves,
        })
}

proptest! {
    #[test]
    fn rolled_progress_stays_in_range(outline in outline_strategy()) {
        let project = outline.build();
        for task in project.tasks() {
            let pct = project.progress(task.id).unwrap();
            prop_assert!((-EPSILON..=100.0 + EPSILON).contains(&pct));
        }
    }

    #[test]
    fn leaves_report_their_own_progress(outline in outline_strategy()) {
        let project = outline.build();
        for (idx, (_, _, pct)) in outline.leaves.iter().enumerate() {
            let id = outline.leaf_id(idx);
            prop_assert!((project.progress(id).unwrap() - f64::from(*pct)).abs() < EPSILON);
        }
    }

    #[test]
    fn raising_a_leaf_never_lowers_any_container(outline in outline_strategy(), pick in any::<usize>()) {
        let mut project = outline.build();
        let before: Vec<(i32, f64)> = project
            .tasks()
            .iter()
            .map(|task| (task.id, project.progress(task.id).unwrap()))
            .collect();

        let leaf = outline.leaf_id(pick % outline.leaves.len());
        project.update_task(leaf, &TaskUpdate::progress(100.0)).unwrap();

        for (id, old) in before {
            prop_assert!(project.progress(id).unwrap() + EPSILON >= old);
        }
    }

    #[test]
    fn containers_lie_between_their_children(outline in outline_strategy()) {
        let project = outline.build();
        for task in project.tasks() {
            let children = project.store().children(task.id);
            if children.is_empty() {
                continue;
            }
            let rolled: Vec<f64> = children
                .iter()
                .map(|child| project.progress(*child).unwrap())
                .collect();
            let low = rolled.iter().copied().fold(f64::INFINITY, f64::min);
            let high = rolled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let pct = project.progress(task.id).unwrap();
            prop_assert!(pct + EPSILON >= low, "{} below {}", pct, low);
            prop_assert!(pct <= high + EPSILON, "{} above {}", pct, high);
        }
    }
}
