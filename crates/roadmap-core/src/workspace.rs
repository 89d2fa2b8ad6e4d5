use crate::dependency::{Dependency, DependencyKind};
use crate::error::{EngineError, EngineResult};
use crate::metadata::ProjectMetadata;
use crate::project::{Commit, Project};
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task addressed across projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    pub project: ProjectId,
    pub task: TaskId,
}

impl TaskRef {
    pub fn new(project: ProjectId, task: TaskId) -> Self {
        Self { project, task }
    }
}

/// Independent projects keyed by handle. Nothing is shared between them.
#[derive(Debug, Default)]
pub struct Workspace {
    projects: BTreeMap<ProjectId, Project>,
    next_id: u32,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_project(&mut self, metadata: ProjectMetadata) -> ProjectId {
        self.insert_project(Project::new(metadata))
    }

    pub fn insert_project(&mut self, project: Project) -> ProjectId {
        self.next_id += 1;
        let id = ProjectId(self.next_id);
        self.projects.insert(id, project);
        id
    }

    pub fn project(&self, id: ProjectId) -> EngineResult<&Project> {
        self.projects.get(&id).ok_or(EngineError::UnknownProject(id))
    }

    pub fn project_mut(&mut self, id: ProjectId) -> EngineResult<&mut Project> {
        self.projects
            .get_mut(&id)
            .ok_or(EngineError::UnknownProject(id))
    }

    pub fn remove_project(&mut self, id: ProjectId) -> EngineResult<Project> {
        self.projects
            .remove(&id)
            .ok_or(EngineError::UnknownProject(id))
    }

    pub fn project_ids(&self) -> Vec<ProjectId> {
        self.projects.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Add an edge addressed by task references. Both ends must live in the
    /// same project.
    pub fn add_dependency(
        &mut self,
        predecessor: TaskRef,
        successor: TaskRef,
        kind: DependencyKind,
        lag_days: i64,
    ) -> EngineResult<Commit> {
        if predecessor.project != successor.project {
            // Surface unknown handles before the cross-project complaint.
            self.project(predecessor.project)?;
            self.project(successor.project)?;
            return Err(EngineError::InvalidEdge(format!(
                "task {} in project {} cannot depend on task {} in project {}",
                successor.task, successor.project, predecessor.task, predecessor.project
            )));
        }
        let dependency = Dependency::finish_to_start(predecessor.task, successor.task)
            .with_kind(kind)
            .with_lag(lag_days);
        self.project_mut(predecessor.project)?
            .add_dependency(dependency)
    }
}
