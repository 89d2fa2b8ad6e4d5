use crate::calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Descriptive project settings. `start_date` anchors offset 0 when offsets
/// are shown as dates; the engine itself never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<WorkCalendarConfig>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            name: "New Project".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            calendar: None,
        }
    }
}

impl ProjectMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// The configured calendar, or a plain Monday–Friday week.
    pub fn work_calendar(&self) -> Result<WorkCalendar, CalendarError> {
        match &self.calendar {
            Some(config) => WorkCalendar::from_config(config),
            None => Ok(WorkCalendar::default()),
        }
    }
}
