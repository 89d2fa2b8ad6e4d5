use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

pub type TaskId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Task,
    /// Zero-duration marker that may group other tasks.
    Milestone,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Task => "task",
            TaskKind::Milestone => "milestone",
        }
    }
}

impl FromStr for TaskKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" | "" => Ok(TaskKind::Task),
            "milestone" => Ok(TaskKind::Milestone),
            _ => Err(()),
        }
    }
}

/// A unit of planned work on the project's linear time axis.
///
/// Offsets (`fixed_start`, `fixed_finish`) are working-day indexes with 0 at
/// the project start. `percent_complete` is on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub kind: TaskKind,
    #[serde(default)]
    pub duration_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_finish: Option<i64>,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            kind: TaskKind::Task,
            duration_days,
            fixed_start: None,
            fixed_finish: None,
            percent_complete: 0.0,
            category: None,
            parent_id: None,
            notes: None,
        }
    }

    pub fn milestone(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            kind: TaskKind::Milestone,
            ..Self::new(id, name, 0)
        }
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_progress(mut self, percent_complete: f64) -> Self {
        self.percent_complete = percent_complete;
        self
    }

    pub fn with_fixed_start(mut self, offset: i64) -> Self {
        self.fixed_start = Some(offset);
        self
    }

    pub fn with_fixed_finish(mut self, offset: i64) -> Self {
        self.fixed_finish = Some(offset);
        self
    }

    pub fn is_milestone(&self) -> bool {
        self.kind == TaskKind::Milestone
    }

    /// Start implied by the manual anchors, if any.
    pub fn anchored_start(&self) -> Option<i64> {
        self.fixed_start
            .or_else(|| self.fixed_finish.map(|finish| finish - self.duration_days))
    }

    /// Apply a partial update, producing the candidate record. The caller
    /// validates the result before committing it.
    pub fn merged(&self, update: &TaskUpdate) -> Task {
        let mut task = self.clone();
        if let Some(name) = &update.name {
            task.name = name.clone();
        }
        if let Some(kind) = update.kind {
            task.kind = kind;
        }
        if let Some(duration) = update.duration_days {
            task.duration_days = duration;
        }
        if let Some(start) = update.fixed_start {
            task.fixed_start = start;
        }
        if let Some(finish) = update.fixed_finish {
            task.fixed_finish = finish;
        }
        if let Some(pct) = update.percent_complete {
            task.percent_complete = pct;
        }
        if let Some(category) = &update.category {
            task.category = category.clone();
        }
        if let Some(parent) = update.parent_id {
            task.parent_id = parent;
        }
        if let Some(notes) = &update.notes {
            task.notes = notes.clone();
        }
        task
    }
}

/// Field set accepted by `update_task`. `None` leaves a field untouched;
/// the nested options on anchors, category, parent and notes allow clearing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TaskKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fixed_start: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fixed_finish: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f64>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<TaskId>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

/// A field that is present maps to `Some`, so an explicit `null` arrives as
/// `Some(None)` and clears the value.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskUpdate {
    pub fn duration(days: i64) -> Self {
        Self {
            duration_days: Some(days),
            ..Self::default()
        }
    }

    pub fn progress(percent_complete: f64) -> Self {
        Self {
            percent_complete: Some(percent_complete),
            ..Self::default()
        }
    }

    pub fn fixed_start(offset: Option<i64>) -> Self {
        Self {
            fixed_start: Some(offset),
            ..Self::default()
        }
    }

    pub fn parent(parent_id: Option<TaskId>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }

    /// Whether applying the update can move any computed date.
    pub fn touches_schedule(&self) -> bool {
        self.kind.is_some()
            || self.duration_days.is_some()
            || self.fixed_start.is_some()
            || self.fixed_finish.is_some()
    }
}
