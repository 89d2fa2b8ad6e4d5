use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Successor cannot start before the predecessor finishes.
    #[default]
    FinishToStart,
    /// Successor cannot start before the predecessor starts.
    StartToStart,
    /// Successor cannot finish before the predecessor finishes.
    FinishToFinish,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "fs",
            DependencyKind::StartToStart => "ss",
            DependencyKind::FinishToFinish => "ff",
        }
    }

    /// Lower bound on the successor's start given the predecessor's
    /// propagated dates.
    pub fn successor_start_bound(
        &self,
        pred_start: i64,
        pred_finish: i64,
        lag: i64,
        succ_duration: i64,
    ) -> i64 {
        match self {
            DependencyKind::FinishToStart => pred_finish + lag,
            DependencyKind::StartToStart => pred_start + lag,
            DependencyKind::FinishToFinish => pred_finish + lag - succ_duration,
        }
    }

    /// Upper bound on the predecessor's finish given the successor's late
    /// dates.
    pub fn predecessor_finish_bound(
        &self,
        succ_late_start: i64,
        succ_late_finish: i64,
        lag: i64,
        pred_duration: i64,
    ) -> i64 {
        match self {
            DependencyKind::FinishToStart => succ_late_start - lag,
            DependencyKind::StartToStart => succ_late_start - lag + pred_duration,
            DependencyKind::FinishToFinish => succ_late_finish - lag,
        }
    }
}

impl FromStr for DependencyKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fs" | "finish_to_start" | "" => Ok(DependencyKind::FinishToStart),
            "ss" | "start_to_start" => Ok(DependencyKind::StartToStart),
            "ff" | "finish_to_finish" => Ok(DependencyKind::FinishToFinish),
            _ => Err(()),
        }
    }
}

/// Ordered edge of the dependency DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor: TaskId,
    pub successor: TaskId,
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn finish_to_start(predecessor: TaskId, successor: TaskId) -> Self {
        Self {
            predecessor,
            successor,
            kind: DependencyKind::FinishToStart,
            lag_days: 0,
        }
    }

    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }
}
