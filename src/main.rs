use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use habitdesk::api;
use habitdesk::calendar::CalendarDay;
use habitdesk::cli::{
    Cli, Commands, ConfigCommands, HabitCommands, ReminderCommands, TodoCommands,
};
use habitdesk::config::Config;
use habitdesk::dates::{DateRange, date_key, local_date, parse_day_key};
use habitdesk::db::{Database, NewHabit, NewReminder, NewTodo};
use habitdesk::model::{HabitKind, Priority, ReminderStatus, TodoStatus};
use habitdesk::service;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Habit { command } => handle_habit_command(command),
        Commands::Todo { command } => handle_todo_command(command),
        Commands::Reminder { command } => handle_reminder_command(command),
        Commands::Calendar { month, from, to } => handle_calendar(month, from, to),
        Commands::Dashboard { date } => handle_dashboard(date),
        Commands::Serve => {
            let config = Config::load_or_init()?;
            run_server(config).await
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_init()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_or_init()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = Config::load_or_init()?;
    let database = Database::open(&config.db_path)?;
    let counts = database.counts(&config.user_id)?;

    println!("habitdesk status");
    println!("- config: {}", Config::config_path()?.display());
    println!("- db_path: {}", config.db_path.display());
    println!("- user_id: {}", config.user_id);
    println!("- habits: {}", counts.habits);
    println!("- completions: {}", counts.completions);
    println!("- todos: {}", counts.todos);
    println!("- reminders: {}", counts.reminders);

    Ok(())
}

fn handle_habit_command(command: HabitCommands) -> Result<()> {
    let config = Config::load_or_init()?;
    let mut database = Database::open(&config.db_path)?;
    let user_id = config.user_id.as_str();

    match command {
        HabitCommands::Add { title, days, kind } => {
            let kind = HabitKind::parse(&kind)
                .with_context(|| format!("Unknown habit kind: {kind}. Use builder or quitter"))?;
            let habit = database.create_habit(
                user_id,
                &NewHabit {
                    title,
                    recurrence: days,
                    kind,
                },
                Utc::now(),
            )?;
            info!(habit_id = %habit.id, "habit created");

            println!("Habit added: {} ({})", habit.title, habit.id);
            Ok(())
        }
        HabitCommands::List { date } => {
            let today = parse_optional_date(date)?;
            let progress = service::habit_progress(&database, user_id, today, &Local)?;

            if progress.is_empty() {
                println!("No habits yet. Add one with `habitdesk habit add <title>`.");
                return Ok(());
            }

            println!("Habits on {}", date_key(today));
            for habit in progress {
                let mark = match (habit.due_today, habit.completed_today) {
                    (_, true) => "[x]",
                    (true, false) => "[ ]",
                    (false, false) => "[-]",
                };
                let days = if habit.every_day {
                    "daily".to_string()
                } else if habit.recurrence.is_empty() {
                    "never due".to_string()
                } else {
                    habit.recurrence.join(",")
                };
                println!(
                    "{mark} {} ({}, {days}) streak {} / best {} / week {}% - {}",
                    habit.title,
                    habit.kind.as_str(),
                    habit.current_streak,
                    habit.longest_streak,
                    habit.weekly_rate,
                    habit.habit_id
                );
            }

            Ok(())
        }
        HabitCommands::Done { id, date } => {
            let date = parse_optional_date(date)?;
            service::mark_habit_done(&database, user_id, &id, date, Utc::now(), &Local)?;

            println!("Habit {id} marked done for {}", date_key(date));
            Ok(())
        }
        HabitCommands::Undo { id, date } => {
            let date = parse_optional_date(date)?;
            let removed = service::unmark_habit_day(&database, user_id, &id, date, &Local)?;

            println!(
                "Removed {removed} completion(s) of {id} on {}",
                date_key(date)
            );
            Ok(())
        }
        HabitCommands::Remove { id } => {
            if !database.delete_habit(user_id, &id)? {
                bail!("Habit not found: {id}");
            }
            info!(habit_id = %id, "habit removed");

            println!("Habit removed: {id}");
            Ok(())
        }
    }
}

fn handle_todo_command(command: TodoCommands) -> Result<()> {
    let config = Config::load_or_init()?;
    let database = Database::open(&config.db_path)?;
    let user_id = config.user_id.as_str();

    match command {
        TodoCommands::Add {
            title,
            due,
            priority,
            parent,
        } => {
            let due_at = due
                .as_deref()
                .map(|raw| local_end_of_day(parse_day_key(raw)?))
                .transpose()?;
            let todo = database.create_todo(
                user_id,
                &NewTodo {
                    title,
                    due_at,
                    priority: parse_optional_priority(priority)?,
                    parent_id: parent,
                },
                Utc::now(),
            )?;
            info!(todo_id = %todo.id, "todo created");

            println!("Todo added: {} ({})", todo.title, todo.id);
            Ok(())
        }
        TodoCommands::List { all } => {
            let now = Utc::now();
            let today = now.with_timezone(&Local).date_naive();
            let todos = database
                .todos(user_id)?
                .into_iter()
                .filter(|todo| all || todo.status == TodoStatus::Pending)
                .collect::<Vec<_>>();

            if todos.is_empty() {
                println!("No todos.");
                return Ok(());
            }

            for todo in todos {
                let due = todo
                    .due_at
                    .as_ref()
                    .map(|due| date_key(local_date(due, &Local)))
                    .unwrap_or_else(|| "-".to_string());
                let overdue = if todo.is_overdue(today, &Local) {
                    " (overdue)"
                } else {
                    ""
                };
                let indent = if todo.parent_id.is_some() { "  " } else { "" };
                let timer = todo
                    .timer
                    .as_ref()
                    .map(|timer| {
                        let state = if timer.is_running() { ", running" } else { "" };
                        format!(" timer {}{state}", format_elapsed(timer.elapsed_at(now)))
                    })
                    .unwrap_or_default();
                println!(
                    "{indent}[{}] {} due {due}{overdue}{timer} priority {} - {}",
                    todo.status.as_str(),
                    todo.title,
                    todo.priority
                        .map(|priority| priority.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    todo.id
                );
            }

            Ok(())
        }
        TodoCommands::Done { id } => {
            update_todo_status(&database, user_id, &id, TodoStatus::Completed)
        }
        TodoCommands::Archive { id } => {
            update_todo_status(&database, user_id, &id, TodoStatus::Archived)
        }
        TodoCommands::Start { id } => {
            let timer = database
                .start_todo_timer(user_id, &id, Utc::now())?
                .with_context(|| format!("Todo not found: {id}"))?;
            info!(todo_id = %id, "todo timer started");

            println!(
                "Timer running for {id} ({} so far)",
                format_elapsed(timer.elapsed_seconds)
            );
            Ok(())
        }
        TodoCommands::Stop { id } => {
            let timer = database
                .stop_todo_timer(user_id, &id, Utc::now())?
                .with_context(|| format!("Todo not found: {id}"))?;
            info!(todo_id = %id, elapsed_seconds = timer.elapsed_seconds, "todo timer stopped");

            println!(
                "Timer stopped for {id}: {} total",
                format_elapsed(timer.elapsed_seconds)
            );
            Ok(())
        }
    }
}

fn format_elapsed(seconds: u64) -> String {
    format!("{}h{:02}m", seconds / 3600, seconds % 3600 / 60)
}

fn update_todo_status(
    database: &Database,
    user_id: &str,
    todo_id: &str,
    status: TodoStatus,
) -> Result<()> {
    if !database.set_todo_status(user_id, todo_id, status)? {
        bail!("Todo not found: {todo_id}");
    }
    info!(todo_id = %todo_id, status = status.as_str(), "todo status updated");

    println!("Todo {todo_id} is now {}", status.as_str());
    Ok(())
}

fn handle_reminder_command(command: ReminderCommands) -> Result<()> {
    let config = Config::load_or_init()?;
    let database = Database::open(&config.db_path)?;
    let user_id = config.user_id.as_str();

    match command {
        ReminderCommands::Add {
            title,
            at,
            priority,
        } => {
            let reminder = database.create_reminder(
                user_id,
                &NewReminder {
                    title,
                    remind_at: parse_local_datetime(&at)?,
                    priority: parse_optional_priority(priority)?,
                },
                Utc::now(),
            )?;
            info!(reminder_id = %reminder.id, "reminder created");

            println!("Reminder added: {} ({})", reminder.title, reminder.id);
            Ok(())
        }
        ReminderCommands::List { all } => {
            let reminders = database
                .reminders(user_id)?
                .into_iter()
                .filter(|reminder| all || reminder.status == ReminderStatus::Pending)
                .collect::<Vec<_>>();

            if reminders.is_empty() {
                println!("No reminders.");
                return Ok(());
            }

            for reminder in reminders {
                println!(
                    "[{}] {} at {} - {}",
                    reminder.status.as_str(),
                    reminder.title,
                    reminder.remind_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    reminder.id
                );
            }

            Ok(())
        }
        ReminderCommands::Done { id } => {
            update_reminder_status(&database, user_id, &id, ReminderStatus::Completed)
        }
        ReminderCommands::Dismiss { id } => {
            update_reminder_status(&database, user_id, &id, ReminderStatus::Dismissed)
        }
    }
}

fn update_reminder_status(
    database: &Database,
    user_id: &str,
    reminder_id: &str,
    status: ReminderStatus,
) -> Result<()> {
    if !database.set_reminder_status(user_id, reminder_id, status)? {
        bail!("Reminder not found: {reminder_id}");
    }
    info!(reminder_id = %reminder_id, status = status.as_str(), "reminder status updated");

    println!("Reminder {reminder_id} is now {}", status.as_str());
    Ok(())
}

fn handle_calendar(month: Option<String>, from: Option<String>, to: Option<String>) -> Result<()> {
    let config = Config::load_or_init()?;
    let database = Database::open(&config.db_path)?;
    let today = Local::now().date_naive();

    let days = match (from, to) {
        (None, None) => {
            let (year, month) = match month {
                Some(raw) => service::parse_month(&raw)?,
                None => (today.year(), today.month()),
            };
            service::calendar_month(
                &database,
                &config.user_id,
                year,
                month,
                config.week_start_day()?,
                today,
                &Local,
            )?
        }
        (from, to) => {
            let start = from.as_deref().map(parse_day_key).transpose()?.unwrap_or(today);
            let end = to.as_deref().map(parse_day_key).transpose()?.unwrap_or(start);
            let range = DateRange::new(start, end)?;
            service::calendar_range(&database, &config.user_id, range, today, &Local)?
        }
    };

    for day in &days {
        print_calendar_day(day);
    }

    Ok(())
}

fn print_calendar_day(day: &CalendarDay) {
    let marker = if day.is_today { "*" } else { " " };
    let period = if day.is_current_period { "" } else { " (outside)" };

    if !day.has_items {
        println!("{marker}{} {}{period}", day.day_key, day.weekday);
        return;
    }

    println!(
        "{marker}{} {}{period}  habits {}/{}  todos {}/{}  reminders {}/{}",
        day.day_key,
        day.weekday,
        day.habits.completed,
        day.habits.total,
        day.todos.completed,
        day.todos.total,
        day.reminders.completed,
        day.reminders.total
    );
}

fn handle_dashboard(date: Option<String>) -> Result<()> {
    let config = Config::load_or_init()?;
    let database = Database::open(&config.db_path)?;
    let today = parse_optional_date(date)?;
    let dashboard = service::dashboard(
        &database,
        &config.user_id,
        today,
        config.upcoming_days,
        &Local,
    )?;

    println!("Dashboard {}", dashboard.date);
    println!(
        "- habits: {}/{} done today, best streak {}, weekly average {}%",
        dashboard.habits_completed_today,
        dashboard.habits_due_today,
        dashboard.best_current_streak,
        dashboard.average_weekly_rate
    );
    println!(
        "- todos: {} pending, {} overdue, {} due today, {} completed",
        dashboard.pending_todos,
        dashboard.overdue_todos,
        dashboard.todos_due_today,
        dashboard.completed_todos
    );
    println!("- reminders today: {}", dashboard.reminders_today.len());
    for reminder in &dashboard.reminders_today {
        println!(
            "  {} {}",
            reminder.remind_at.with_timezone(&Local).format("%H:%M"),
            reminder.title
        );
    }
    println!("- upcoming reminders: {}", dashboard.upcoming_reminders.len());
    for reminder in &dashboard.upcoming_reminders {
        println!(
            "  {} {}",
            reminder.remind_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            reminder.title
        );
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let _ = Database::open(&config.db_path)?;

    let shared_config = Arc::new(config);
    info!("habitdesk service started");

    tokio::select! {
        api_result = api::run_server(shared_config) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(parse_day_key)
        .transpose()?
        .map_or_else(|| Ok(Local::now().date_naive()), Ok)
}

fn parse_optional_priority(input: Option<String>) -> Result<Option<Priority>> {
    input
        .as_deref()
        .map(|raw| {
            Priority::parse(raw)
                .with_context(|| format!("Unknown priority: {raw}. Use low, medium or high"))
        })
        .transpose()
}

fn parse_local_datetime(input: &str) -> Result<chrono::DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), "%Y-%m-%d %H:%M")
        .with_context(|| format!("Invalid time format: {input}. Example: 2026-02-18 09:30"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("Time does not exist in the local zone: {input}"))
}

fn local_end_of_day(date: NaiveDate) -> Result<chrono::DateTime<Utc>> {
    let naive = date
        .and_hms_opt(23, 59, 0)
        .with_context(|| format!("Failed to build due time for {date}"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("Failed to convert due date to local time: {date}"))
}
