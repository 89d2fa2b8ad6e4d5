use crate::task::TaskId;
use crate::workspace::ProjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised at the mutation boundary. None of them leave a partial
/// edit behind: the graph and the published snapshot stay as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("dependency {predecessor} -> {successor} would create a cycle")]
    Cycle {
        predecessor: TaskId,
        successor: TaskId,
    },

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("dependency {predecessor} -> {successor} not found")]
    DependencyNotFound {
        predecessor: TaskId,
        successor: TaskId,
    },

    #[error("dependency {predecessor} -> {successor} already exists")]
    DuplicateEdge {
        predecessor: TaskId,
        successor: TaskId,
    },

    #[error("task {0} already exists")]
    DuplicateTask(TaskId),

    #[error("invalid dependency: {0}")]
    InvalidEdge(String),

    #[error("invalid value: {0}")]
    InvalidDuration(String),

    #[error("invalid containment: {0}")]
    InvalidContainment(String),

    #[error("project {0} not found")]
    UnknownProject(ProjectId),
}

impl EngineError {
    pub fn invalid_duration(message: impl Into<String>) -> Self {
        Self::InvalidDuration(message.into())
    }

    pub fn invalid_containment(message: impl Into<String>) -> Self {
        Self::InvalidContainment(message.into())
    }

    /// True for the "unknown task or edge" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_) | Self::DependencyNotFound { .. } | Self::UnknownProject(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A manual anchor that sits earlier than the dependency network allows.
///
/// Informational only: the schedule is still produced, the anchor is kept
/// as the task's reported start, and successors are driven by
/// `derived_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub task_id: TaskId,
    pub anchored_start: i64,
    pub derived_start: i64,
}

impl ScheduleConflict {
    /// Working days by which the anchor undercuts the feasible start.
    pub fn shortfall(&self) -> i64 {
        self.derived_start - self.anchored_start
    }
}

impl std::fmt::Display for ScheduleConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} is anchored at day {} but its dependencies allow day {} at the earliest",
            self.task_id, self.anchored_start, self.derived_start
        )
    }
}
