use crate::dependency::Dependency;
use crate::error::{EngineError, EngineResult};
use crate::task::Task;
use std::collections::HashSet;

const EPSILON: f64 = 1e-6;

/// Ceiling on durations, anchors and lags, in working days. Keeps every sum
/// the passes compute far away from `i64` overflow.
pub const MAX_OFFSET_DAYS: i64 = 100_000;

/// Checks a task record in isolation: durations, progress range and the
/// consistency of its manual anchors.
pub fn validate_task(task: &Task) -> EngineResult<()> {
    if task.duration_days < 0 {
        return Err(EngineError::invalid_duration(format!(
            "task {} has negative duration {}",
            task.id, task.duration_days
        )));
    }

    if task.duration_days > MAX_OFFSET_DAYS {
        return Err(EngineError::invalid_duration(format!(
            "task {} duration {} exceeds the {} day limit",
            task.id, task.duration_days, MAX_OFFSET_DAYS
        )));
    }

    if task.is_milestone() && task.duration_days != 0 {
        return Err(EngineError::invalid_duration(format!(
            "milestone {} must have zero duration (got {})",
            task.id, task.duration_days
        )));
    }

    let pct = task.percent_complete;
    if !pct.is_finite() || pct < -EPSILON || pct > 100.0 + EPSILON {
        return Err(EngineError::invalid_duration(format!(
            "task {} has invalid percent_complete {} (must be between 0 and 100)",
            task.id, pct
        )));
    }

    if let Some(start) = task.fixed_start {
        if start < 0 {
            return Err(EngineError::invalid_duration(format!(
                "task {} has negative fixed start {}",
                task.id, start
            )));
        }
        if start > MAX_OFFSET_DAYS {
            return Err(EngineError::invalid_duration(format!(
                "task {} fixed start {} exceeds the {} day limit",
                task.id, start, MAX_OFFSET_DAYS
            )));
        }
    }

    if let Some(finish) = task.fixed_finish {
        if finish > MAX_OFFSET_DAYS {
            return Err(EngineError::invalid_duration(format!(
                "task {} fixed finish {} exceeds the {} day limit",
                task.id, finish, MAX_OFFSET_DAYS
            )));
        }
        if finish < task.duration_days {
            return Err(EngineError::invalid_duration(format!(
                "task {} fixed finish {} leaves no room for its {} day duration",
                task.id, finish, task.duration_days
            )));
        }
        if let Some(start) = task.fixed_start {
            if finish - start != task.duration_days {
                return Err(EngineError::invalid_duration(format!(
                    "task {} anchors {}..{} disagree with its {} day duration",
                    task.id, start, finish, task.duration_days
                )));
            }
        }
    }

    if task.parent_id == Some(task.id) {
        return Err(EngineError::invalid_containment(format!(
            "task {} cannot contain itself",
            task.id
        )));
    }

    Ok(())
}

pub fn validate_dependency(dependency: &Dependency) -> EngineResult<()> {
    if dependency.predecessor == dependency.successor {
        return Err(EngineError::InvalidEdge(format!(
            "task {} cannot depend on itself",
            dependency.predecessor
        )));
    }
    if dependency.lag_days < 0 {
        return Err(EngineError::invalid_duration(format!(
            "dependency {} -> {} has negative lag {}",
            dependency.predecessor, dependency.successor, dependency.lag_days
        )));
    }
    if dependency.lag_days > MAX_OFFSET_DAYS {
        return Err(EngineError::invalid_duration(format!(
            "dependency {} -> {} lag {} exceeds the {} day limit",
            dependency.predecessor, dependency.successor, dependency.lag_days, MAX_OFFSET_DAYS
        )));
    }
    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> EngineResult<()> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(EngineError::DuplicateTask(task.id));
        }
        validate_task(task)?;
    }
    Ok(())
}
