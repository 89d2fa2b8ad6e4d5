pub mod calculations;
pub mod calendar;
pub mod dependency;
pub mod error;
pub mod export;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod metadata;
pub mod persistence;
pub mod project;
pub mod schedule;
pub mod slot;
pub mod task;
pub(crate) mod task_validation;
pub mod workspace;

pub use calculations::{CriticalPath, StatusSummary, TaskStatus};
pub use calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};
pub use dependency::{Dependency, DependencyKind};
pub use error::{EngineError, EngineResult, ScheduleConflict};
pub use export::snapshot_to_dataframe;
pub use graph::{GraphStore, ScheduleDag, would_create_cycle};
pub use metadata::ProjectMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteProjectStore;
pub use persistence::{
    PersistenceError, ProjectRecord, ProjectStore, load_project_from_csv, load_project_from_json,
    save_project_to_csv, save_project_to_json,
};
pub use project::{Commit, Project, RecomputeMode};
pub use schedule::{ScheduleEntry, ScheduleSnapshot};
pub use slot::SnapshotSlot;
pub use task::{Task, TaskId, TaskKind, TaskUpdate};
pub use task_validation::MAX_OFFSET_DAYS;
pub use workspace::{ProjectId, TaskRef, Workspace};
