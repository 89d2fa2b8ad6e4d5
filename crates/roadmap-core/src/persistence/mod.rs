use crate::dependency::Dependency;
use crate::error::EngineError;
use crate::graph::store::GraphStore;
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::task::Task;
use polars::prelude::PolarsError;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("rejected by engine: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no project stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Plain records of one project: what gets written to disk. Computed
/// schedule values are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub metadata: ProjectMetadata,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ProjectRecord {
    pub fn from_project(project: &Project) -> Self {
        Self {
            metadata: project.metadata().clone(),
            tasks: project.tasks().into_iter().cloned().collect(),
            dependencies: project.dependencies(),
        }
    }

    /// Rebuild through the graph store so loaded data passes the same checks
    /// as interactive edits.
    pub fn into_project(self) -> PersistenceResult<Project> {
        let store = GraphStore::from_records(self.tasks, &self.dependencies)?;
        Ok(Project::from_parts(self.metadata, store))
    }
}

pub trait ProjectStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()>;
    fn load_project(&self) -> PersistenceResult<Option<Project>>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_project_from_csv, load_project_from_json, save_project_to_csv, save_project_to_json,
};
