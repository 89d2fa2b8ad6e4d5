use super::{PersistenceError, PersistenceResult, ProjectRecord};
use crate::dependency::{Dependency, DependencyKind};
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::task::{Task, TaskId, TaskKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let record = ProjectRecord::from_project(project);
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &record)?;
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let record: ProjectRecord = serde_json::from_reader(file)?;
    debug!(tasks = record.tasks.len(), "loaded project json");
    record.into_project()
}

/// One CSV row per task. A single leading row named `__metadata__` carries
/// the project metadata as JSON.
#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: TaskId,
    name: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    duration_days: i64,
    #[serde(default)]
    fixed_start: String,
    #[serde(default)]
    fixed_finish: String,
    #[serde(default)]
    percent_complete: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    parent_id: String,
    /// `id[:kind[:lag]]` tokens separated by commas.
    #[serde(default)]
    predecessors: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    metadata_json: String,
}

impl TaskCsvRecord {
    fn from_task(task: &Task, predecessors: &[Dependency]) -> Self {
        TaskCsvRecord {
            id: task.id,
            name: task.name.clone(),
            kind: task.kind.as_str().to_string(),
            duration_days: task.duration_days,
            fixed_start: format_option(task.fixed_start),
            fixed_finish: format_option(task.fixed_finish),
            percent_complete: task.percent_complete.to_string(),
            category: task.category.clone().unwrap_or_default(),
            parent_id: format_option(task.parent_id),
            predecessors: join_predecessors(predecessors),
            notes: task.notes.clone().unwrap_or_default(),
            metadata_json: String::new(),
        }
    }

    fn metadata_row(metadata: &ProjectMetadata) -> PersistenceResult<Self> {
        Ok(TaskCsvRecord {
            name: "__metadata__".to_string(),
            metadata_json: serde_json::to_string(metadata)?,
            ..TaskCsvRecord::default()
        })
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn into_task(self) -> PersistenceResult<(Task, Vec<Dependency>)> {
        let kind = self.kind.parse::<TaskKind>().map_err(|_| {
            PersistenceError::InvalidData(format!("invalid kind '{}' for task {}", self.kind, self.id))
        })?;
        let mut task = Task::new(self.id, self.name, self.duration_days);
        task.kind = kind;
        task.fixed_start = parse_option::<i64>(&self.fixed_start)?;
        task.fixed_finish = parse_option::<i64>(&self.fixed_finish)?;
        task.percent_complete = parse_option::<f64>(&self.percent_complete)?.unwrap_or(0.0);
        task.category = non_empty(self.category);
        task.parent_id = parse_option::<TaskId>(&self.parent_id)?;
        task.notes = non_empty(self.notes);
        let predecessors = split_predecessors(&self.predecessors, task.id)?;
        Ok((task, predecessors))
    }
}

pub fn save_project_to_csv<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let dependencies = project.dependencies();
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(TaskCsvRecord::metadata_row(project.metadata())?)?;
    for task in project.tasks() {
        let predecessors: Vec<Dependency> = dependencies
            .iter()
            .filter(|dep| dep.successor == task.id)
            .copied()
            .collect();
        writer.serialize(TaskCsvRecord::from_task(task, &predecessors))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_project_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut metadata: Option<ProjectMetadata> = None;
    let mut tasks = Vec::new();
    let mut dependencies = Vec::new();

    for record in reader.deserialize::<TaskCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if metadata.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
            })?);
            continue;
        }
        let (task, predecessors) = record.into_task()?;
        tasks.push(task);
        dependencies.extend(predecessors);
    }

    if metadata.is_none() && tasks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained neither metadata nor tasks".into(),
        ));
    }
    debug!(tasks = tasks.len(), edges = dependencies.len(), "loaded project csv");

    ProjectRecord {
        metadata: metadata.unwrap_or_default(),
        tasks,
        dependencies,
    }
    .into_project()
}

fn format_option<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_option<T>(input: &str) -> PersistenceResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid value '{input}': {e}")))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn join_predecessors(dependencies: &[Dependency]) -> String {
    dependencies
        .iter()
        .map(|dep| match (dep.kind, dep.lag_days) {
            (DependencyKind::FinishToStart, 0) => dep.predecessor.to_string(),
            (kind, 0) => format!("{}:{}", dep.predecessor, kind.as_str()),
            (kind, lag) => format!("{}:{}:{}", dep.predecessor, kind.as_str(), lag),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn split_predecessors(input: &str, successor: TaskId) -> PersistenceResult<Vec<Dependency>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(|token| -> PersistenceResult<Dependency> {
            let mut parts = token.trim().split(':');
            let predecessor = parts
                .next()
                .unwrap_or_default()
                .trim()
                .parse::<TaskId>()
                .map_err(|e| {
                    PersistenceError::InvalidData(format!("invalid predecessor '{token}': {e}"))
                })?;
            let kind = match parts.next() {
                Some(kind) => kind.parse::<DependencyKind>().map_err(|_| {
                    PersistenceError::InvalidData(format!("invalid dependency kind in '{token}'"))
                })?,
                None => DependencyKind::FinishToStart,
            };
            let lag = parse_option::<i64>(parts.next().unwrap_or_default())?.unwrap_or(0);
            Ok(Dependency::finish_to_start(predecessor, successor)
                .with_kind(kind)
                .with_lag(lag))
        })
        .collect()
}
