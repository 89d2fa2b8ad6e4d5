use serde::{Deserialize, Serialize};

const COMPLETE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

impl TaskStatus {
    /// Classify a task against the `as_of` offset.
    pub fn classify(percent_complete: f64, earliest_finish: i64, as_of: i64) -> Self {
        if percent_complete >= COMPLETE {
            TaskStatus::Completed
        } else if earliest_finish < as_of {
            TaskStatus::Overdue
        } else if percent_complete > 0.0 {
            TaskStatus::InProgress
        } else {
            TaskStatus::NotStarted
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Overdue => "Overdue",
        }
    }
}

/// Project-wide counts over leaf tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub as_of: i64,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub overdue: usize,
    pub overall_progress: f64,
}

impl StatusSummary {
    pub fn tally<I>(as_of: i64, leaves: I) -> Self
    where
        I: IntoIterator<Item = (f64, i64)>,
    {
        let mut summary = StatusSummary {
            as_of,
            ..StatusSummary::default()
        };
        let mut progress_sum = 0.0;
        for (percent_complete, earliest_finish) in leaves {
            summary.total += 1;
            progress_sum += percent_complete;
            match TaskStatus::classify(percent_complete, earliest_finish, as_of) {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::NotStarted => summary.not_started += 1,
                TaskStatus::Overdue => summary.overdue += 1,
            }
        }
        if summary.total > 0 {
            summary.overall_progress = progress_sum / summary.total as f64;
        }
        summary
    }
}
