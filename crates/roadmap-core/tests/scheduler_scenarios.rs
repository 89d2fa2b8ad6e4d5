mod common;

use common::{A, B, C, fork_project};
use roadmap_engine::{Dependency, EngineError, Project, ScheduleConflict, Task, TaskUpdate};
use std::sync::Arc;

#[test]
fn fork_duration_follows_longest_branch() {
    let project = fork_project();

    assert_eq!(project.project_duration(), 7);
    assert_eq!(project.critical_path().tasks, vec![A, C]);
    assert_eq!(project.critical_path().chains, vec![vec![A, C]]);

    let b = project.schedule(B).unwrap();
    assert_eq!(b.total_slack, 2);
    assert_eq!(b.free_slack, 2);
    assert!(!b.is_critical);
    assert_eq!((b.earliest_start, b.earliest_finish), (3, 5));
    assert_eq!((b.latest_start, b.latest_finish), (5, 7));
}

#[test]
fn serializing_branches_extends_the_critical_path() {
    let mut project = fork_project();
    project
        .add_dependency(Dependency::finish_to_start(B, C))
        .unwrap();

    assert_eq!(project.project_duration(), 9);
    assert_eq!(project.critical_path().tasks, vec![A, B, C]);
    assert_eq!(project.critical_path().chains, vec![vec![A, B, C]]);
    assert_eq!(
        project.critical_path().edges,
        vec![(A, B), (A, C), (B, C)]
    );
}

#[test]
fn back_edge_is_rejected_and_nothing_changes() {
    let mut project = fork_project();
    let before = project.snapshot();
    let deps_before = project.dependencies();

    let err = project
        .add_dependency(Dependency::finish_to_start(C, A))
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::Cycle {
            predecessor: C,
            successor: A
        }
    );
    assert_eq!(project.dependencies(), deps_before);
    assert!(Arc::ptr_eq(&before, &project.snapshot()));
    assert_eq!(project.project_duration(), 7);
}

#[test]
fn early_anchor_is_flagged_and_successors_use_derived_dates() {
    let mut project = Project::default();
    project.add_task(Task::new(1, "P", 5)).unwrap();
    project
        .add_task(Task::new(2, "D", 2).with_fixed_start(1))
        .unwrap();
    project.add_task(Task::new(3, "E", 1)).unwrap();
    project
        .add_dependency(Dependency::finish_to_start(1, 2))
        .unwrap();
    project
        .add_dependency(Dependency::finish_to_start(2, 3))
        .unwrap();

    assert_eq!(
        project.conflicts(),
        vec![ScheduleConflict {
            task_id: 2,
            anchored_start: 1,
            derived_start: 5
        }]
    );
    let d = project.schedule(2).unwrap();
    assert_eq!(d.earliest_start, 1);
    assert_eq!(d.earliest_finish, 3);
    assert_eq!(d.driving_start, 5);
    assert_eq!(d.total_slack, 0);

    let e = project.schedule(3).unwrap();
    assert_eq!(e.earliest_start, 7);
    assert_eq!(project.project_duration(), 8);
}

#[test]
fn conflict_clears_once_the_anchor_is_feasible() {
    let mut project = Project::default();
    project.add_task(Task::new(1, "P", 5)).unwrap();
    project
        .add_task(Task::new(2, "D", 2).with_fixed_start(1))
        .unwrap();
    project
        .add_dependency(Dependency::finish_to_start(1, 2))
        .unwrap();
    assert_eq!(project.conflicts().len(), 1);

    project
        .update_task(2, &TaskUpdate::fixed_start(Some(6)))
        .unwrap();
    assert!(project.conflicts().is_empty());
    assert_eq!(project.schedule(2).unwrap().earliest_start, 6);
    assert_eq!(project.project_duration(), 8);
}

#[test]
fn milestone_rollup_weights_children_by_duration() {
    let mut project = Project::default();
    project.add_task(Task::milestone(10, "M")).unwrap();
    project
        .add_task(Task::new(11, "X", 2).with_parent(10).with_progress(100.0))
        .unwrap();
    project
        .add_task(Task::new(12, "Y", 2).with_parent(10).with_progress(0.0))
        .unwrap();

    assert_eq!(project.progress(10), Some(50.0));
    assert_eq!(project.progress(11), Some(100.0));
}

#[test]
fn removing_a_task_cascades_its_edges() {
    let mut project = fork_project();
    project.remove_task(A).unwrap();

    assert!(project.dependencies().is_empty());
    assert_eq!(project.project_duration(), 4);
    assert!(project.schedule(A).is_none());
    assert_eq!(project.remove_task(A).unwrap_err(), EngineError::TaskNotFound(A));
}

#[test]
fn fixed_finish_anchor_sets_start() {
    let mut project = Project::default();
    project
        .add_task(Task::new(1, "Late", 3).with_fixed_finish(10))
        .unwrap();
    let entry = project.schedule(1).unwrap();
    assert_eq!(entry.earliest_start, 7);
    assert_eq!(entry.earliest_finish, 10);
    assert_eq!(project.project_duration(), 3);
}
