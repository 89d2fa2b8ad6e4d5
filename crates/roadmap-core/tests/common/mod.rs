#![allow(dead_code)]

use roadmap_engine::{Dependency, Project, Task};

pub const A: i32 = 1;
pub const B: i32 = 2;
pub const C: i32 = 3;

/// A(3); B(2) and C(4) both after A.
pub fn fork_project() -> Project {
    let mut project = Project::default();
    project.add_task(Task::new(A, "A", 3)).unwrap();
    project.add_task(Task::new(B, "B", 2)).unwrap();
    project.add_task(Task::new(C, "C", 4)).unwrap();
    project.add_dependency(Dependency::finish_to_start(A, B)).unwrap();
    project.add_dependency(Dependency::finish_to_start(A, C)).unwrap();
    project
}

pub fn chain_project(durations: &[i64]) -> Project {
    let mut project = Project::default();
    for (idx, duration) in durations.iter().enumerate() {
        let id = idx as i32 + 1;
        project
            .add_task(Task::new(id, format!("T{id}"), *duration))
            .unwrap();
        if id > 1 {
            project
                .add_dependency(Dependency::finish_to_start(id - 1, id))
                .unwrap();
        }
    }
    project
}
