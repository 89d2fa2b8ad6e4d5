use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    CriticalPath, Dependency, EngineError, ProjectId, ProjectMetadata, ScheduleConflict,
    ScheduleEntry, ScheduleSnapshot, StatusSummary, Task, TaskId, TaskUpdate, Workspace,
};

#[derive(Clone)]
pub struct AppState {
    workspace: Arc<RwLock<Workspace>>,
}

impl AppState {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
        }
    }

    pub fn with_shared(workspace: Arc<RwLock<Workspace>>) -> Self {
        Self { workspace }
    }

    fn workspace(&self) -> Arc<RwLock<Workspace>> {
        self.workspace.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        let message = value.to_string();
        match value {
            EngineError::TaskNotFound(_)
            | EngineError::DependencyNotFound { .. }
            | EngineError::UnknownProject(_) => ApiError::NotFound(message),
            EngineError::Cycle { .. }
            | EngineError::DuplicateEdge { .. }
            | EngineError::DuplicateTask(_) => ApiError::Conflict(message),
            EngineError::InvalidEdge(_)
            | EngineError::InvalidDuration(_)
            | EngineError::InvalidContainment(_) => ApiError::Invalid(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ProjectSummary {
    id: ProjectId,
    name: String,
    task_count: usize,
    project_duration: i64,
}

#[derive(Debug, Serialize)]
struct TaskView {
    task: Task,
    schedule: Option<ScheduleEntry>,
    progress: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CommitView {
    revision: u64,
    project_duration: Option<i64>,
    conflicts: Vec<ScheduleConflict>,
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    #[serde(default)]
    as_of: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:pid", get(get_project).delete(delete_project))
        .route("/projects/:pid/tasks", get(list_tasks).post(create_task))
        .route(
            "/projects/:pid/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(
            "/projects/:pid/dependencies",
            get(list_dependencies).post(create_dependency),
        )
        .route(
            "/projects/:pid/dependencies/:pred/:succ",
            delete(delete_dependency),
        )
        .route("/projects/:pid/schedule", get(get_schedule))
        .route("/projects/:pid/critical_path", get(get_critical_path))
        .route("/projects/:pid/summary", get(get_summary))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, workspace: Workspace) -> std::io::Result<()> {
    let state = AppState::new(workspace);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectSummary>> {
    let workspace = state.workspace();
    let guard = workspace.read();
    let projects = guard
        .project_ids()
        .into_iter()
        .filter_map(|id| {
            let project = guard.project(id).ok()?;
            Some(ProjectSummary {
                id,
                name: project.name().to_string(),
                task_count: project.store().len(),
                project_duration: project.project_duration(),
            })
        })
        .collect();
    Json(projects)
}

async fn create_project(
    State(state): State<AppState>,
    Json(metadata): Json<ProjectMetadata>,
) -> Result<(StatusCode, Json<ProjectSummary>), ApiError> {
    metadata
        .work_calendar()
        .map_err(|err| ApiError::Invalid(err.to_string()))?;
    let workspace = state.workspace();
    let mut guard = workspace.write();
    let name = metadata.name.clone();
    let id = guard.create_project(metadata);
    Ok((
        StatusCode::CREATED,
        Json(ProjectSummary {
            id,
            name,
            task_count: 0,
            project_duration: 0,
        }),
    ))
}

async fn get_project(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<ProjectMetadata>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    Ok(Json(guard.project(ProjectId(pid))?.metadata().clone()))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<StatusCode, ApiError> {
    let workspace = state.workspace();
    workspace.write().remove_project(ProjectId(pid))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    let project = guard.project(ProjectId(pid))?;
    let snapshot = project.snapshot();
    let views = project
        .tasks()
        .into_iter()
        .map(|task| task_view(task, &snapshot))
        .collect();
    Ok(Json(views))
}

async fn get_task(
    State(state): State<AppState>,
    Path((pid, task_id)): Path<(u32, TaskId)>,
) -> Result<Json<TaskView>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    let project = guard.project(ProjectId(pid))?;
    let task = project
        .task(task_id)
        .ok_or(EngineError::TaskNotFound(task_id))?;
    Ok(Json(task_view(task, &project.snapshot())))
}

async fn create_task(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
    Json(task): Json<Task>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let workspace = state.workspace();
    let mut guard = workspace.write();
    let project = guard.project_mut(ProjectId(pid))?;
    let task_id = task.id;
    project.add_task(task)?;
    let task = project
        .task(task_id)
        .ok_or(EngineError::TaskNotFound(task_id))?;
    Ok((StatusCode::CREATED, Json(task_view(task, &project.snapshot()))))
}

async fn update_task(
    State(state): State<AppState>,
    Path((pid, task_id)): Path<(u32, TaskId)>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<TaskView>, ApiError> {
    let workspace = state.workspace();
    let mut guard = workspace.write();
    let project = guard.project_mut(ProjectId(pid))?;
    project.update_task(task_id, &update)?;
    let task = project
        .task(task_id)
        .ok_or(EngineError::TaskNotFound(task_id))?;
    Ok(Json(task_view(task, &project.snapshot())))
}

async fn delete_task(
    State(state): State<AppState>,
    Path((pid, task_id)): Path<(u32, TaskId)>,
) -> Result<StatusCode, ApiError> {
    let workspace = state.workspace();
    let mut guard = workspace.write();
    guard.project_mut(ProjectId(pid))?.remove_task(task_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_dependencies(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<Vec<Dependency>>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    Ok(Json(guard.project(ProjectId(pid))?.dependencies()))
}

async fn create_dependency(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
    Json(dependency): Json<Dependency>,
) -> Result<(StatusCode, Json<CommitView>), ApiError> {
    let workspace = state.workspace();
    let mut guard = workspace.write();
    let commit = guard
        .project_mut(ProjectId(pid))?
        .add_dependency(dependency)?;
    let view = CommitView {
        revision: commit.revision(),
        project_duration: commit.snapshot().map(|s| s.project_duration),
        conflicts: commit
            .snapshot()
            .map(|s| s.conflicts.clone())
            .unwrap_or_default(),
    };
    Ok((StatusCode::CREATED, Json(view)))
}

async fn delete_dependency(
    State(state): State<AppState>,
    Path((pid, pred, succ)): Path<(u32, TaskId, TaskId)>,
) -> Result<StatusCode, ApiError> {
    let workspace = state.workspace();
    let mut guard = workspace.write();
    guard
        .project_mut(ProjectId(pid))?
        .remove_dependency(pred, succ)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<ScheduleSnapshot>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    let snapshot = guard.project(ProjectId(pid))?.snapshot();
    Ok(Json(ScheduleSnapshot::clone(&snapshot)))
}

async fn get_critical_path(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<CriticalPath>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    Ok(Json(guard.project(ProjectId(pid))?.critical_path()))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<StatusSummary>, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    Ok(Json(
        guard.project(ProjectId(pid))?.status_summary(query.as_of),
    ))
}

fn task_view(task: &Task, snapshot: &ScheduleSnapshot) -> TaskView {
    TaskView {
        task: task.clone(),
        schedule: snapshot.entry(task.id).copied(),
        progress: snapshot.progress(task.id),
    }
}
