use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use roadmap_engine::{
    Dependency, DependencyKind, EngineError, Project, Task, TaskId, TaskUpdate,
    load_project_from_csv, load_project_from_json, logging, save_project_to_csv,
    save_project_to_json, snapshot_to_dataframe,
};
use std::io::{self, Write};

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let rows: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show current schedule\n  add <id> <name> <duration_days> [preds]\n                                     Add a task (preds like 1,2:ss:1,3:ff)\n  milestone <id> <name> [parent_id]  Add a milestone\n  dep <pred> <succ> [fs|ss|ff] [lag] Add a dependency\n  undep <pred> <succ>                Remove a dependency\n  dur <id> <days>                    Set duration\n  anchor <id> <start|finish> <offset|none>\n                                     Set or clear a manual anchor\n  pct <id> <float>                   Set percent complete (0-100)\n  parent <id> <milestone_id|none>    Move a task under a milestone\n  delete <id>                        Delete a task and its dependencies\n  crit                               Show critical path and chains\n  conflicts                          List manual anchors that undercut dependencies\n  summary [as_of]                    Status counts as of a day offset\n  meta show                          Show project metadata\n  meta name <text...>                Update project name\n  meta desc <text...>                Update project description\n  meta start <YYYY-MM-DD>            Update the calendar start date\n  save <json|csv> <path>             Persist project to disk\n  load <json|csv> <path>             Load project from disk\n  quit|exit                          Exit"
    );
}

fn print_schedule(project: &Project) {
    match snapshot_to_dataframe(project) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering schedule: {}", e),
    }
}

fn print_metadata(project: &Project) {
    let metadata = project.metadata();
    println!("Project name       : {}", metadata.name);
    println!("Project description: {}", metadata.description);
    println!("Project start date : {}", metadata.start_date);
}

fn print_critical_path(project: &Project) {
    let snapshot = project.snapshot();
    let path = &snapshot.critical_path;
    let ids = path
        .tasks
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Project duration   : {}", snapshot.project_duration);
    println!("Critical tasks     : {}", ids);
    for chain in &path.chains {
        let chain = chain
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("  chain: {}", chain);
    }
}

fn report(project: &Project, result: Result<(), EngineError>, done: &str) {
    match result {
        Ok(()) => {
            println!("{} ({})", done, project.snapshot().to_cli_summary());
            for conflict in project.conflicts() {
                println!("Warning: {}", conflict);
            }
        }
        Err(EngineError::Cycle {
            predecessor,
            successor,
        }) => println!(
            "Rejected: {} -> {} would create a cycle.",
            predecessor, successor
        ),
        Err(e) => println!("Error: {}", e),
    }
}

fn parse_id(value: Option<&str>) -> Option<TaskId> {
    value.and_then(|v| v.parse::<TaskId>().ok())
}

fn parse_optional_offset(value: &str) -> Option<Option<i64>> {
    if value.eq_ignore_ascii_case("none") {
        Some(None)
    } else {
        value.parse::<i64>().ok().map(Some)
    }
}

fn parse_pred_list(s: &str, successor: TaskId) -> Option<Vec<Dependency>> {
    s.split(',')
        .map(|token| {
            let mut parts = token.trim().split(':');
            let predecessor = parts.next()?.parse::<TaskId>().ok()?;
            let kind = match parts.next() {
                Some(kind) => kind.parse::<DependencyKind>().ok()?,
                None => DependencyKind::FinishToStart,
            };
            let lag = match parts.next() {
                Some(lag) => lag.parse::<i64>().ok()?,
                None => 0,
            };
            Some(
                Dependency::finish_to_start(predecessor, successor)
                    .with_kind(kind)
                    .with_lag(lag),
            )
        })
        .collect()
}

fn main() {
    if let Err(e) = logging::init_logging() {
        eprintln!("logging disabled: {}", e);
    }

    let mut project = Project::default();

    println!("Roadmap Engine (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_schedule(&project),
            "add" => {
                let id = parse_id(parts.next());
                let name = parts.next();
                let duration = parts.next().and_then(|d| d.parse::<i64>().ok());
                let (Some(id), Some(name), Some(duration)) = (id, name, duration) else {
                    println!("Usage: add <id> <name> <duration_days> [preds]");
                    continue;
                };
                let preds = match parts.next() {
                    Some(list) => match parse_pred_list(list, id) {
                        Some(preds) => preds,
                        None => {
                            println!("Invalid predecessor list '{}'", list);
                            continue;
                        }
                    },
                    None => Vec::new(),
                };
                let mut result = match preds.iter().find(|dep| project.task(dep.predecessor).is_none()) {
                    Some(dep) => Err(EngineError::TaskNotFound(dep.predecessor)),
                    None => project.add_task(Task::new(id, name, duration)).map(|_| ()),
                };
                let added = result.is_ok();
                for dep in preds {
                    if result.is_err() {
                        break;
                    }
                    result = project.add_dependency(dep).map(|_| ());
                }
                if added && result.is_err() {
                    // All or nothing: drop the task together with any edges it got.
                    let _ = project.remove_task(id);
                }
                report(&project, result, "Task added.");
            }
            "milestone" => {
                let id = parse_id(parts.next());
                let name = parts.next();
                let (Some(id), Some(name)) = (id, name) else {
                    println!("Usage: milestone <id> <name> [parent_id]");
                    continue;
                };
                let mut task = Task::milestone(id, name);
                task.parent_id = parse_id(parts.next());
                let result = project.add_task(task).map(|_| ());
                report(&project, result, "Milestone added.");
            }
            "dep" | "undep" => {
                let (Some(pred), Some(succ)) = (parse_id(parts.next()), parse_id(parts.next()))
                else {
                    println!("Usage: {} <pred> <succ>", cmd);
                    continue;
                };
                let result = if cmd == "undep" {
                    project.remove_dependency(pred, succ).map(|_| ())
                } else {
                    let kind = parts.next().unwrap_or("fs").parse::<DependencyKind>();
                    let lag = parts.next().unwrap_or("0").parse::<i64>();
                    let (Ok(kind), Ok(lag)) = (kind, lag) else {
                        println!("Usage: dep <pred> <succ> [fs|ss|ff] [lag]");
                        continue;
                    };
                    let dep = Dependency::finish_to_start(pred, succ)
                        .with_kind(kind)
                        .with_lag(lag);
                    project.add_dependency(dep).map(|_| ())
                };
                report(&project, result, "Dependencies updated.");
            }
            "dur" => {
                let id = parse_id(parts.next());
                let days = parts.next().and_then(|d| d.parse::<i64>().ok());
                let (Some(id), Some(days)) = (id, days) else {
                    println!("Usage: dur <id> <days>");
                    continue;
                };
                let result = project.update_task(id, &TaskUpdate::duration(days)).map(|_| ());
                report(&project, result, "Duration set.");
            }
            "anchor" => {
                let id = parse_id(parts.next());
                let which = parts.next();
                let offset = parts.next().and_then(parse_optional_offset);
                let update = match (which, offset) {
                    (Some("start"), Some(offset)) => TaskUpdate::fixed_start(offset),
                    (Some("finish"), Some(offset)) => TaskUpdate {
                        fixed_finish: Some(offset),
                        ..TaskUpdate::default()
                    },
                    _ => {
                        println!("Usage: anchor <id> <start|finish> <offset|none>");
                        continue;
                    }
                };
                let Some(id) = id else {
                    println!("Invalid id");
                    continue;
                };
                let result = project.update_task(id, &update).map(|_| ());
                report(&project, result, "Anchor set.");
            }
            "pct" => {
                let id = parse_id(parts.next());
                let pct = parts.next().and_then(|v| v.parse::<f64>().ok());
                let (Some(id), Some(pct)) = (id, pct) else {
                    println!("Usage: pct <id> <float>");
                    continue;
                };
                let result = project.update_task(id, &TaskUpdate::progress(pct)).map(|_| ());
                report(&project, result, "Progress set.");
            }
            "parent" => {
                let id = parse_id(parts.next());
                let parent = parts.next().and_then(|p| {
                    if p.eq_ignore_ascii_case("none") {
                        Some(None)
                    } else {
                        p.parse::<TaskId>().ok().map(Some)
                    }
                });
                let (Some(id), Some(parent)) = (id, parent) else {
                    println!("Usage: parent <id> <milestone_id|none>");
                    continue;
                };
                let result = project.update_task(id, &TaskUpdate::parent(parent)).map(|_| ());
                report(&project, result, "Parent set.");
            }
            "delete" => match parse_id(parts.next()) {
                Some(id) => match project.remove_task(id) {
                    Ok(_) => {
                        println!("Deleted task {id}.");
                        print_schedule(&project);
                    }
                    Err(EngineError::TaskNotFound(_)) => println!("Task {id} not found."),
                    Err(e) => println!("Error deleting task: {}", e),
                },
                None => println!("Usage: delete <id>"),
            },
            "crit" => print_critical_path(&project),
            "conflicts" => {
                let conflicts = project.conflicts();
                if conflicts.is_empty() {
                    println!("No schedule conflicts.");
                }
                for conflict in conflicts {
                    println!("{}", conflict);
                }
            }
            "summary" => {
                let as_of = parts.next().and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
                let s = project.status_summary(as_of);
                println!(
                    "as_of={} total={} completed={} in_progress={} not_started={} overdue={} progress={:.1}%",
                    s.as_of,
                    s.total,
                    s.completed,
                    s.in_progress,
                    s.not_started,
                    s.overdue,
                    s.overall_progress
                );
            }
            "meta" => match parts.next() {
                Some("show") | None => print_metadata(&project),
                Some("name") => {
                    let rest = parts.collect::<Vec<_>>().join(" ");
                    project.metadata_mut().name = rest;
                    print_metadata(&project);
                }
                Some("desc") => {
                    let rest = parts.collect::<Vec<_>>().join(" ");
                    project.metadata_mut().description = rest;
                    print_metadata(&project);
                }
                Some("start") => match parts
                    .next()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                {
                    Some(date) => {
                        project.metadata_mut().start_date = date;
                        print_metadata(&project);
                    }
                    None => println!("Invalid date (YYYY-MM-DD)"),
                },
                Some(other) => {
                    println!("Unknown meta command '{}'.", other);
                    println!("Usage: meta show|name <text>|desc <text>|start <YYYY-MM-DD>");
                }
            },
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => save_project_to_json(&project, path),
                    (Some("csv"), Some(path)) => save_project_to_csv(&project, path),
                    _ => {
                        println!("Usage: save <json|csv> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(_) => println!("Project saved to {}.", path.unwrap_or_default()),
                    Err(e) => println!("Error saving project: {}", e),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let loaded = match (fmt, path) {
                    (Some("json"), Some(path)) => load_project_from_json(path),
                    (Some("csv"), Some(path)) => load_project_from_csv(path),
                    _ => {
                        println!("Usage: load <json|csv> <path>");
                        continue;
                    }
                };
                match loaded {
                    Ok(loaded) => {
                        project = loaded;
                        println!("Project loaded from {}.", path.unwrap_or_default());
                        print_schedule(&project);
                    }
                    Err(e) => println!("Error loading project: {}", e),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
