use crate::project::Project;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

// Days between 0001-01-01 and 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn date_series(name: &'static str, dates: Vec<i32>) -> PolarsResult<Series> {
    Series::new(PlSmallStr::from_static(name), dates).cast(&DataType::Date)
}

/// Tabular view of the current snapshot, one row per task in insertion
/// order, for visualization and export writers.
///
/// Offsets are kept as integer columns; `start_date`/`finish_date` render
/// them through the project's work calendar.
pub fn snapshot_to_dataframe(project: &Project) -> PolarsResult<DataFrame> {
    let snapshot = project.snapshot();
    let calendar = project
        .metadata()
        .work_calendar()
        .map_err(|err| PolarsError::ComputeError(err.to_string().into()))?;
    let origin = project.metadata().start_date;

    let tasks: Vec<_> = project
        .tasks()
        .into_iter()
        .filter(|task| snapshot.entry(task.id).is_some())
        .collect();
    let height = tasks.len();

    let mut ids = Vec::with_capacity(height);
    let mut names = Vec::with_capacity(height);
    let mut kinds = Vec::with_capacity(height);
    let mut durations = Vec::with_capacity(height);
    let mut early_start = Vec::with_capacity(height);
    let mut early_finish = Vec::with_capacity(height);
    let mut late_start = Vec::with_capacity(height);
    let mut late_finish = Vec::with_capacity(height);
    let mut total_slack = Vec::with_capacity(height);
    let mut free_slack = Vec::with_capacity(height);
    let mut is_critical = Vec::with_capacity(height);
    let mut has_conflict = Vec::with_capacity(height);
    let mut progress = Vec::with_capacity(height);
    let mut parent: Vec<Option<i32>> = Vec::with_capacity(height);
    let mut category: Vec<Option<&str>> = Vec::with_capacity(height);
    let mut start_dates = Vec::with_capacity(height);
    let mut finish_dates = Vec::with_capacity(height);

    for task in &tasks {
        let Some(entry) = snapshot.entry(task.id) else {
            continue;
        };
        ids.push(task.id);
        names.push(task.name.as_str());
        kinds.push(task.kind.as_str());
        durations.push(task.duration_days);
        early_start.push(entry.earliest_start);
        early_finish.push(entry.earliest_finish);
        late_start.push(entry.latest_start);
        late_finish.push(entry.latest_finish);
        total_slack.push(entry.total_slack);
        free_slack.push(entry.free_slack);
        is_critical.push(entry.is_critical);
        has_conflict.push(snapshot.conflict(task.id).is_some());
        progress.push(snapshot.progress(task.id).unwrap_or(task.percent_complete));
        parent.push(task.parent_id);
        category.push(task.category.as_deref());
        start_dates.push(date_to_i32(calendar.date_at(origin, entry.earliest_start)));
        finish_dates.push(date_to_i32(calendar.finish_date(
            origin,
            entry.earliest_start,
            entry.earliest_finish,
        )));
    }

    let columns = vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("kind"), kinds).into_column(),
        Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
        Series::new(PlSmallStr::from_static("early_start"), early_start).into_column(),
        Series::new(PlSmallStr::from_static("early_finish"), early_finish).into_column(),
        Series::new(PlSmallStr::from_static("late_start"), late_start).into_column(),
        Series::new(PlSmallStr::from_static("late_finish"), late_finish).into_column(),
        Series::new(PlSmallStr::from_static("total_slack"), total_slack).into_column(),
        Series::new(PlSmallStr::from_static("free_slack"), free_slack).into_column(),
        Series::new(PlSmallStr::from_static("is_critical"), is_critical).into_column(),
        Series::new(PlSmallStr::from_static("has_conflict"), has_conflict).into_column(),
        Series::new(PlSmallStr::from_static("percent_complete"), progress).into_column(),
        Series::new(PlSmallStr::from_static("parent_id"), parent).into_column(),
        Series::new(PlSmallStr::from_static("category"), category).into_column(),
        date_series("start_date", start_dates)?.into_column(),
        date_series("finish_date", finish_dates)?.into_column(),
    ];

    DataFrame::new(columns)
}
