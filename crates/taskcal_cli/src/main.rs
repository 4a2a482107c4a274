use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use taskcal_cli::cli::{
    Cli, Command, GroupCommand, build_overrides, collect_config_overrides, expand_alias,
    split_command_line,
};
use taskcal_cli::output;
use taskcal_core::calendar::{self, CalendarAction, CalendarEvent, CalendarState};
use taskcal_core::config::{self, Config, Palette, palette_for_theme};
use taskcal_core::error::AppError;
use taskcal_core::group_api;
use taskcal_core::model::{Priority, Task, format_date, parse_date};
use taskcal_core::query::{StatusFilter, TaskFilter, TaskSort};
use taskcal_core::task_api::{self, NewTask, TaskPatch};
use time::Date;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const TODAY_ENV_VAR: &str = "TASKCAL_TODAY";
const LOG_ENV_VAR: &str = "TASKCAL_LOG";

fn init_tracing() {
    let filter = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

/// The evaluation date. `TASKCAL_TODAY` pins it, otherwise the local date.
fn today() -> Result<Date, AppError> {
    match std::env::var(TODAY_ENV_VAR) {
        Ok(raw) if !raw.trim().is_empty() => parse_date(&raw)
            .map_err(|err| AppError::invalid_input(format!("{TODAY_ENV_VAR}: {}", err.message()))),
        _ => Ok(calendar::local_today()),
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn parse_optional_date(raw: Option<String>) -> Result<Option<Date>, AppError> {
    raw.as_deref().map(parse_date).transpose()
}

fn parse_priority(raw: Option<String>) -> Result<Option<Priority>, AppError> {
    raw.as_deref().map(str::parse::<Priority>).transpose()
}

/// Accepts a group id or a group name.
fn resolve_group(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    group_api::list_groups()?
        .into_iter()
        .find(|group| group.id == trimmed || group.matches_name(trimmed))
        .map(|group| group.id)
        .ok_or_else(|| AppError::not_found(format!("group '{trimmed}' not found")))
}

fn print_task(task: &Task, verb: &str, json: bool) {
    if json {
        println!("{}", output::task_json(task));
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
    }
}

/// Runs a drag of `id` onto `date` through the calendar state machine.
fn drag_to(id: &str, date: Date) -> Result<Task, AppError> {
    let dragging = CalendarState::Idle
        .transition(CalendarEvent::DragStart {
            task_id: id.to_string(),
        })?
        .state;
    let dropped = dragging.transition(CalendarEvent::Drop { date })?;
    debug!(state = dropped.state.name(), "drop handled");

    let Some(CalendarAction::MoveTask { task_id, date }) = dropped.action else {
        return Err(AppError::invalid_input("nothing is being dragged"));
    };
    task_api::move_task_to_date(&task_id, date)
}

/// `interactive` is set inside the shell, where the process outlives a
/// notification long enough for its "Open" button to fire.
fn run_command(
    cli: Cli,
    config: &Config,
    palette: &Palette,
    interactive: bool,
) -> Result<(), AppError> {
    match cli.command {
        Command::Add {
            title,
            description,
            start,
            due,
            priority,
            group,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let new_task = NewTask {
                title,
                description,
                start_date: parse_optional_date(start)?,
                due_date: parse_optional_date(due)?,
                priority: parse_priority(priority)?.unwrap_or_default(),
                group_id: group.as_deref().map(resolve_group).transpose()?,
            };
            let task = task_api::add_task(new_task)?;
            print_task(&task, "Added", cli.json);
        }
        Command::Edit {
            id,
            title,
            description,
            start,
            due,
            priority,
            group,
            clear_description,
            clear_start,
            clear_due,
            clear_group,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                start_date: if clear_start {
                    Some(None)
                } else {
                    parse_optional_date(start)?.map(Some)
                },
                due_date: if clear_due {
                    Some(None)
                } else {
                    parse_optional_date(due)?.map(Some)
                },
                priority: parse_priority(priority)?,
                group_id: if clear_group {
                    Some(None)
                } else {
                    group.as_deref().map(resolve_group).transpose()?.map(Some)
                },
            };
            let task = task_api::edit_task(&id, patch)?;
            print_task(&task, "Updated", cli.json);
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(&id)?;
            print_task(&task, "Deleted", cli.json);
        }
        Command::Show { id } => {
            let task = task_api::get_task_by_id(&id)?;
            let classification = calendar::classify(&task, today()?);
            if cli.json {
                println!("{}", output::task_detail_json(&task, classification));
            } else {
                let groups = group_api::list_groups()?;
                let group = task
                    .group_id
                    .as_deref()
                    .and_then(|id| groups.iter().find(|group| group.id == id));
                for line in output::task_detail_lines(&task, classification, group) {
                    println!("{line}");
                }
            }
        }
        Command::Done { id } => {
            let task = task_api::complete_task(&id)?;
            print_task(&task, "Completed", cli.json);
        }
        Command::Reopen { id } => {
            let task = task_api::reopen_task(&id)?;
            print_task(&task, "Reopened", cli.json);
        }
        Command::List {
            status,
            group,
            priority,
            search,
            sort,
        } => {
            let filter = TaskFilter {
                status: status.parse::<StatusFilter>()?,
                group_id: group.as_deref().map(resolve_group).transpose()?,
                priority: parse_priority(priority)?,
                search,
            };
            let sort = sort.parse::<TaskSort>()?;
            let tasks = task_api::list_tasks(&filter, sort)?;

            if cli.json {
                let payload: Vec<_> = tasks.iter().map(output::task_json).collect();
                println!("{}", serde_json::Value::Array(payload));
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                let groups = group_api::list_groups()?;
                println!("{}", output::task_table(&tasks, &groups));
            }
        }
        Command::Day { date } => {
            let today = today()?;
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => today,
            };
            let items = task_api::tasks_for_day(date, today)?;

            if cli.json {
                let payload: Vec<_> = items.iter().map(output::day_item_json).collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "date": format_date(date),
                        "tasks": payload,
                    })
                );
            } else {
                println!("{}", palette.accentize(&format_date(date)));
                if items.is_empty() {
                    println!("{}", palette.mutedize("Nothing scheduled."));
                }
                for item in &items {
                    println!("{}", output::day_line(item, palette));
                }
            }
        }
        Command::Calendar { month } => {
            let today = today()?;
            let (year, month) = match month {
                Some(raw) => calendar::parse_month(&raw)?,
                None => (today.year(), today.month()),
            };
            let state = task_api::snapshot()?;
            let grid = calendar::month_grid(year, month, config.week_start, &state.tasks, today)?;

            if cli.json {
                println!("{}", output::month_json(&grid));
            } else {
                println!("{}", output::month_table(&grid));
            }
        }
        Command::Move { id, date } => {
            let date = parse_date(&date)?;
            let task = drag_to(&id, date)?;
            print_task(&task, "Moved", cli.json);
        }
        Command::Notify => {
            let outcome = task_api::notify_attention_tasks(today()?, interactive)?;
            for failure in &outcome.failures {
                warn!(task_id = %failure.task_id, error = %failure.error, "notification failed");
            }

            if cli.json {
                let notified: Vec<_> = outcome.items.iter().map(output::day_item_json).collect();
                let failures: Vec<_> = outcome
                    .failures
                    .iter()
                    .map(|failure| {
                        serde_json::json!({
                            "task_id": failure.task_id,
                            "code": failure.error.code(),
                            "message": failure.error.message(),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({ "notified": notified, "failures": failures })
                );
            } else if outcome.items.is_empty() {
                println!("Nothing needs attention.");
            } else {
                for item in &outcome.items {
                    println!("{}", taskcal_core::notify::notification_body(item));
                }
            }
        }
        Command::Group { group } => run_group_command(group, cli.json)?,
    }

    Ok(())
}

fn run_group_command(command: GroupCommand, json: bool) -> Result<(), AppError> {
    match command {
        GroupCommand::Add { name, color } => {
            let group = group_api::add_group(&name, color.as_deref())?;
            if json {
                println!("{}", output::group_json(&group));
            } else {
                println!("Added group: {} ({})", group.name, group.id);
            }
        }
        GroupCommand::List => {
            let groups = group_api::list_groups()?;
            if json {
                let payload: Vec<_> = groups.iter().map(output::group_json).collect();
                println!("{}", serde_json::Value::Array(payload));
            } else {
                println!("{}", output::group_table(&groups));
            }
        }
        GroupCommand::Rename { id, name } => {
            let group = group_api::rename_group(&id, &name)?;
            if json {
                println!("{}", output::group_json(&group));
            } else {
                println!("Renamed group: {} ({})", group.name, group.id);
            }
        }
        GroupCommand::Delete { id } => {
            let deleted = group_api::delete_group(&id)?;
            let default = group_api::default_group()?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "group": output::group_json(&deleted.group),
                        "reassigned": deleted.reassigned,
                        "reassigned_to": default.id,
                    })
                );
            } else {
                println!(
                    "Deleted group: {} ({}), {} task(s) moved to {}",
                    deleted.group.name, deleted.group.id, deleted.reassigned, default.name
                );
            }
        }
    }

    Ok(())
}

/// Applies `--config-override` values and aliases, then hands the arguments to clap.
fn parse_args(base: &Config, args: Vec<String>) -> Result<Option<(Cli, Config)>, AppError> {
    let overrides = build_overrides(&collect_config_overrides(&args))?;
    let config = config::merge_overrides(base, &overrides);
    let args = expand_alias(args, &config.aliases)?;

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("taskcal".to_string());
    argv.extend(args);

    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(Some((cli, config))),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            print!("{err}");
            Ok(None)
        }
        Err(err) => Err(normalize_parse_error(err)),
    }
}

fn dispatch(base: &Config, args: Vec<String>, interactive: bool) -> Result<(), AppError> {
    let Some((cli, config)) = parse_args(base, args)? else {
        return Ok(());
    };
    let palette = palette_for_theme(config.theme.as_deref());
    run_command(cli, &config, &palette, interactive)
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        if let Err(err) = dispatch(base, args, true) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        warn!(error = %err, "config could not be loaded, using defaults");
    }

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let result = if args.is_empty() {
        run_interactive(&loaded.config)
    } else {
        dispatch(&loaded.config, args, false)
    };

    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
