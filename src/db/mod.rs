pub mod queries;

use crate::calendar::Snapshot;
use crate::model::{
    Habit, HabitCompletion, HabitKind, Priority, Reminder, ReminderStatus, Todo, TodoStatus,
    TodoTimer,
};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewHabit {
    pub title: String,
    #[serde(default)]
    pub recurrence: Vec<String>,
    #[serde(default)]
    pub kind: HabitKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReminder {
    pub title: String,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreCounts {
    pub habits: i64,
    pub completions: i64,
    pub todos: i64,
    pub reminders: i64,
}

/// SQLite store. Every query is scoped by the owning `user_id`.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn create_habit(
        &self,
        user_id: &str,
        input: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<Habit> {
        let title = input.title.trim();
        if title.is_empty() {
            bail!("Habit title must not be empty");
        }

        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            recurrence: input
                .recurrence
                .iter()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .collect(),
            kind: input.kind,
            created_at,
        };

        self.conn
            .execute(
                "INSERT INTO habits (id, user_id, title, recurrence, kind, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &habit.id,
                    &habit.user_id,
                    &habit.title,
                    habit.recurrence.join(","),
                    habit.kind.as_str(),
                    habit.created_at.timestamp()
                ],
            )
            .context("Failed to insert habit")?;

        Ok(habit)
    }

    pub fn habits(&self, user_id: &str) -> Result<Vec<Habit>> {
        let mut statement = self.conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC",
            queries::SELECT_HABIT_COLUMNS
        ))?;

        let rows = statement
            .query_map(params![user_id], habit_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query habits")?;

        Ok(rows)
    }

    pub fn habit(&self, user_id: &str, habit_id: &str) -> Result<Option<Habit>> {
        self.conn
            .query_row(
                &format!(
                    "{} WHERE user_id = ?1 AND id = ?2",
                    queries::SELECT_HABIT_COLUMNS
                ),
                params![user_id, habit_id],
                habit_from_row,
            )
            .optional()
            .context("Failed to query habit")
    }

    /// Removes the habit and all of its completions. Returns false if the
    /// user owns no habit with that id.
    pub fn delete_habit(&mut self, user_id: &str, habit_id: &str) -> Result<bool> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        transaction
            .execute(
                "DELETE FROM habit_completions
                 WHERE habit_id IN (SELECT id FROM habits WHERE id = ?1 AND user_id = ?2)",
                params![habit_id, user_id],
            )
            .context("Failed to delete habit completions")?;

        let deleted = transaction
            .execute(
                "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
                params![habit_id, user_id],
            )
            .context("Failed to delete habit")?;

        transaction
            .commit()
            .context("Failed to commit habit deletion")?;

        Ok(deleted > 0)
    }

    pub fn mark_habit_done(
        &self,
        user_id: &str,
        habit_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<HabitCompletion> {
        if self.habit(user_id, habit_id)?.is_none() {
            bail!("Habit not found: {habit_id}");
        }

        let completion = HabitCompletion {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            completed_at,
        };

        self.conn
            .execute(
                "INSERT INTO habit_completions (id, habit_id, completed_at) VALUES (?1, ?2, ?3)",
                params![
                    &completion.id,
                    &completion.habit_id,
                    completion.completed_at.timestamp()
                ],
            )
            .context("Failed to insert habit completion")?;

        Ok(completion)
    }

    /// Deletes every completion of the habit inside `[from, to)`, typically
    /// the bounds of one local day. Returns the number of removed records.
    pub fn unmark_habit_between(
        &self,
        user_id: &str,
        habit_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM habit_completions
                 WHERE habit_id = ?1
                   AND completed_at >= ?2
                   AND completed_at < ?3
                   AND habit_id IN (SELECT id FROM habits WHERE user_id = ?4)",
                params![habit_id, from.timestamp(), to.timestamp(), user_id],
            )
            .context("Failed to delete habit completions")?;

        Ok(deleted)
    }

    pub fn completions(&self, user_id: &str) -> Result<Vec<HabitCompletion>> {
        let mut statement = self.conn.prepare(
            "SELECT c.id, c.habit_id, c.completed_at
             FROM habit_completions c
             JOIN habits h ON h.id = c.habit_id
             WHERE h.user_id = ?1
             ORDER BY c.completed_at ASC",
        )?;

        let rows = statement
            .query_map(params![user_id], |row| {
                Ok(HabitCompletion {
                    id: row.get(0)?,
                    habit_id: row.get(1)?,
                    completed_at: utc_column(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query habit completions")?;

        Ok(rows)
    }

    pub fn create_todo(
        &self,
        user_id: &str,
        input: &NewTodo,
        created_at: DateTime<Utc>,
    ) -> Result<Todo> {
        let title = input.title.trim();
        if title.is_empty() {
            bail!("Todo title must not be empty");
        }

        if let Some(parent_id) = input.parent_id.as_deref() {
            let parent_exists = self
                .conn
                .query_row(
                    "SELECT 1 FROM todos WHERE id = ?1 AND user_id = ?2",
                    params![parent_id, user_id],
                    |_| Ok(()),
                )
                .optional()
                .context("Failed to query parent todo")?
                .is_some();
            if !parent_exists {
                bail!("Parent todo not found: {parent_id}");
            }
        }

        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            status: TodoStatus::Pending,
            due_at: input.due_at,
            priority: input.priority,
            parent_id: input.parent_id.clone(),
            timer: None,
            created_at,
        };

        self.conn
            .execute(
                "INSERT INTO todos (id, user_id, title, status, due_at, priority, parent_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &todo.id,
                    &todo.user_id,
                    &todo.title,
                    todo.status.as_str(),
                    todo.due_at.map(|due| due.timestamp()),
                    todo.priority.map(|priority| priority.as_str()),
                    &todo.parent_id,
                    todo.created_at.timestamp()
                ],
            )
            .context("Failed to insert todo")?;

        Ok(todo)
    }

    pub fn todos(&self, user_id: &str) -> Result<Vec<Todo>> {
        let mut statement = self.conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC",
            queries::SELECT_TODO_COLUMNS
        ))?;

        let rows = statement
            .query_map(params![user_id], todo_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query todos")?;

        Ok(rows)
    }

    pub fn todo(&self, user_id: &str, todo_id: &str) -> Result<Option<Todo>> {
        self.conn
            .query_row(
                &format!(
                    "{} WHERE id = ?1 AND user_id = ?2",
                    queries::SELECT_TODO_COLUMNS
                ),
                params![todo_id, user_id],
                todo_from_row,
            )
            .optional()
            .context("Failed to query todo")
    }

    /// Starts the todo's timer. Returns `None` if the user owns no such todo.
    pub fn start_todo_timer(
        &self,
        user_id: &str,
        todo_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TodoTimer>> {
        let Some(todo) = self.todo(user_id, todo_id)? else {
            return Ok(None);
        };
        if todo.status != TodoStatus::Pending {
            bail!("Cannot start a timer on a {} todo", todo.status.as_str());
        }

        let timer = todo.timer.unwrap_or_default().start(now);
        self.write_todo_timer(user_id, todo_id, &timer)?;

        Ok(Some(timer))
    }

    /// Stops the timer and folds the running segment into the elapsed total.
    pub fn stop_todo_timer(
        &self,
        user_id: &str,
        todo_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TodoTimer>> {
        let Some(todo) = self.todo(user_id, todo_id)? else {
            return Ok(None);
        };

        let timer = todo.timer.unwrap_or_default().stop(now);
        self.write_todo_timer(user_id, todo_id, &timer)?;

        Ok(Some(timer))
    }

    fn write_todo_timer(&self, user_id: &str, todo_id: &str, timer: &TodoTimer) -> Result<()> {
        self.conn
            .execute(
                "UPDATE todos SET timer_started_at = ?1, timer_elapsed_sec = ?2
                 WHERE id = ?3 AND user_id = ?4",
                params![
                    timer.started_at.map(|started| started.timestamp()),
                    i64::try_from(timer.elapsed_seconds).unwrap_or(i64::MAX),
                    todo_id,
                    user_id
                ],
            )
            .context("Failed to update todo timer")?;

        Ok(())
    }

    pub fn set_todo_status(&self, user_id: &str, todo_id: &str, status: TodoStatus) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE todos SET status = ?1 WHERE id = ?2 AND user_id = ?3",
                params![status.as_str(), todo_id, user_id],
            )
            .context("Failed to update todo status")?;

        Ok(updated > 0)
    }

    pub fn create_reminder(
        &self,
        user_id: &str,
        input: &NewReminder,
        created_at: DateTime<Utc>,
    ) -> Result<Reminder> {
        let title = input.title.trim();
        if title.is_empty() {
            bail!("Reminder title must not be empty");
        }

        let reminder = Reminder {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            remind_at: input.remind_at,
            status: ReminderStatus::Pending,
            priority: input.priority,
            created_at,
        };

        self.conn
            .execute(
                "INSERT INTO reminders (id, user_id, title, remind_at, status, priority, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    &reminder.id,
                    &reminder.user_id,
                    &reminder.title,
                    reminder.remind_at.timestamp(),
                    reminder.status.as_str(),
                    reminder.priority.map(|priority| priority.as_str()),
                    reminder.created_at.timestamp()
                ],
            )
            .context("Failed to insert reminder")?;

        Ok(reminder)
    }

    pub fn reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let mut statement = self.conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY remind_at ASC, rowid ASC",
            queries::SELECT_REMINDER_COLUMNS
        ))?;

        let rows = statement
            .query_map(params![user_id], reminder_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query reminders")?;

        Ok(rows)
    }

    pub fn set_reminder_status(
        &self,
        user_id: &str,
        reminder_id: &str,
        status: ReminderStatus,
    ) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE reminders SET status = ?1 WHERE id = ?2 AND user_id = ?3",
                params![status.as_str(), reminder_id, user_id],
            )
            .context("Failed to update reminder status")?;

        Ok(updated > 0)
    }

    pub fn snapshot(&self, user_id: &str) -> Result<Snapshot> {
        Ok(Snapshot {
            habits: self.habits(user_id)?,
            completions: self.completions(user_id)?,
            todos: self.todos(user_id)?,
            reminders: self.reminders(user_id)?,
        })
    }

    pub fn counts(&self, user_id: &str) -> Result<StoreCounts> {
        let count = |sql: &str| -> Result<i64> {
            self.conn
                .query_row(sql, params![user_id], |row| row.get(0))
                .with_context(|| format!("Failed to count rows: {sql}"))
        };

        Ok(StoreCounts {
            habits: count("SELECT COUNT(*) FROM habits WHERE user_id = ?1")?,
            completions: count(
                "SELECT COUNT(*) FROM habit_completions c JOIN habits h ON h.id = c.habit_id WHERE h.user_id = ?1",
            )?,
            todos: count("SELECT COUNT(*) FROM todos WHERE user_id = ?1")?,
            reminders: count("SELECT COUNT(*) FROM reminders WHERE user_id = ?1")?,
        })
    }
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let recurrence: String = row.get(3)?;
    let kind: String = row.get(4)?;

    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        recurrence: recurrence
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        kind: HabitKind::parse(&kind).unwrap_or_default(),
        created_at: utc_column(row, 5)?,
    })
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let status: String = row.get(3)?;
    let priority: Option<String> = row.get(5)?;
    let timer_started_at = optional_utc_column(row, 7)?;
    let timer_elapsed_sec: Option<i64> = row.get(8)?;

    let timer = (timer_started_at.is_some() || timer_elapsed_sec.is_some()).then(|| TodoTimer {
        started_at: timer_started_at,
        elapsed_seconds: timer_elapsed_sec.unwrap_or_default().max(0) as u64,
    });

    Ok(Todo {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        status: TodoStatus::parse(&status).unwrap_or_default(),
        due_at: optional_utc_column(row, 4)?,
        priority: priority.as_deref().and_then(Priority::parse),
        parent_id: row.get(6)?,
        timer,
        created_at: utc_column(row, 9)?,
    })
}

fn reminder_from_row(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    let status: String = row.get(4)?;
    let priority: Option<String> = row.get(5)?;

    Ok(Reminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        remind_at: utc_column(row, 3)?,
        status: ReminderStatus::parse(&status).unwrap_or_default(),
        priority: priority.as_deref().and_then(Priority::parse),
        created_at: utc_column(row, 6)?,
    })
}

fn utc_column(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let timestamp: i64 = row.get(index)?;
    DateTime::from_timestamp(timestamp, 0)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(index, timestamp))
}

fn optional_utc_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let timestamp: Option<i64> = row.get(index)?;
    timestamp
        .map(|value| {
            DateTime::from_timestamp(value, 0)
                .ok_or(rusqlite::Error::IntegralValueOutOfRange(index, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::{Database, NewHabit, NewReminder, NewTodo};
    use crate::dates::{day_bounds, parse_day_key};
    use crate::model::{HabitKind, Priority, ReminderStatus, TodoStatus, TodoTimer};
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let database = Database::open(&dir.path().join("db").join("test.db")).expect("open db");
        (dir, database)
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
    }

    fn new_habit(title: &str, recurrence: &[&str]) -> NewHabit {
        NewHabit {
            title: title.to_string(),
            recurrence: recurrence.iter().map(|token| token.to_string()).collect(),
            kind: HabitKind::Builder,
        }
    }

    #[test]
    fn habits_round_trip_with_recurrence() {
        let (_dir, database) = open_temp();
        let created = database
            .create_habit("alice", &new_habit("  Stretch ", &["Mon", " Wed ", ""]), at(1, 8))
            .expect("create");

        let habits = database.habits("alice").expect("list");
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, created.id);
        assert_eq!(habits[0].title, "Stretch");
        assert_eq!(habits[0].recurrence, vec!["Mon", "Wed"]);
        assert_eq!(habits[0].created_at, at(1, 8));
    }

    #[test]
    fn empty_title_is_rejected() {
        let (_dir, database) = open_temp();
        assert!(database.create_habit("alice", &new_habit("  ", &[]), at(1, 8)).is_err());
    }

    #[test]
    fn data_is_isolated_per_user() {
        let (_dir, database) = open_temp();
        let habit = database
            .create_habit("alice", &new_habit("Read", &[]), at(1, 8))
            .expect("create");
        database
            .mark_habit_done("alice", &habit.id, at(2, 8))
            .expect("mark");

        assert!(database.habits("bob").expect("list").is_empty());
        assert!(database.completions("bob").expect("list").is_empty());
        assert!(database.habit("bob", &habit.id).expect("get").is_none());
        assert!(database.mark_habit_done("bob", &habit.id, at(3, 8)).is_err());
        assert_eq!(database.counts("alice").expect("counts").completions, 1);
    }

    #[test]
    fn unmark_removes_every_record_of_that_day() {
        let (_dir, database) = open_temp();
        let habit = database
            .create_habit("alice", &new_habit("Walk", &[]), at(1, 8))
            .expect("create");
        for completed_at in [at(4, 7), at(5, 7), at(5, 19), at(6, 7)] {
            database
                .mark_habit_done("alice", &habit.id, completed_at)
                .expect("mark");
        }

        let (from, to) = day_bounds(parse_day_key("2024-06-05").unwrap(), &Utc).expect("bounds");
        let removed = database
            .unmark_habit_between("alice", &habit.id, from, to)
            .expect("unmark");

        assert_eq!(removed, 2);
        let remaining = database.completions("alice").expect("list");
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].completed_at, at(4, 7));
        assert_eq!(remaining[1].completed_at, at(6, 7));
    }

    #[test]
    fn deleting_habit_drops_its_completions() {
        let (_dir, mut database) = open_temp();
        let habit = database
            .create_habit("alice", &new_habit("Floss", &[]), at(1, 8))
            .expect("create");
        database
            .mark_habit_done("alice", &habit.id, at(2, 8))
            .expect("mark");

        assert!(!database.delete_habit("bob", &habit.id).expect("delete"));
        assert!(database.delete_habit("alice", &habit.id).expect("delete"));
        assert!(database.habits("alice").expect("list").is_empty());
        assert_eq!(database.counts("alice").expect("counts").completions, 0);
    }

    #[test]
    fn todos_support_subtasks_and_status_changes() {
        let (_dir, database) = open_temp();
        let parent = database
            .create_todo(
                "alice",
                &NewTodo {
                    title: "Plan trip".to_string(),
                    due_at: Some(at(10, 12)),
                    priority: Some(Priority::High),
                    parent_id: None,
                },
                at(1, 8),
            )
            .expect("parent");
        let child = database
            .create_todo(
                "alice",
                &NewTodo {
                    title: "Book hotel".to_string(),
                    due_at: None,
                    priority: None,
                    parent_id: Some(parent.id.clone()),
                },
                at(1, 9),
            )
            .expect("child");

        assert!(database
            .set_todo_status("alice", &child.id, TodoStatus::Completed)
            .expect("update"));
        assert!(!database
            .set_todo_status("bob", &child.id, TodoStatus::Archived)
            .expect("update"));

        let todos = database.todos("alice").expect("list");
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].priority, Some(Priority::High));
        assert_eq!(todos[0].due_at, Some(at(10, 12)));
        assert_eq!(todos[1].parent_id.as_deref(), Some(parent.id.as_str()));
        assert_eq!(todos[1].status, TodoStatus::Completed);
        assert!(todos[1].timer.is_none());
    }

    #[test]
    fn subtask_requires_existing_parent() {
        let (_dir, database) = open_temp();
        let result = database.create_todo(
            "alice",
            &NewTodo {
                title: "Orphan".to_string(),
                due_at: None,
                priority: None,
                parent_id: Some("missing".to_string()),
            },
            at(1, 8),
        );

        assert!(result.is_err());
    }

    #[test]
    fn reminders_are_ordered_by_time() {
        let (_dir, database) = open_temp();
        let later = database
            .create_reminder(
                "alice",
                &NewReminder {
                    title: "Dentist".to_string(),
                    remind_at: at(12, 9),
                    priority: Some(Priority::Medium),
                },
                at(1, 8),
            )
            .expect("later");
        database
            .create_reminder(
                "alice",
                &NewReminder {
                    title: "Call mom".to_string(),
                    remind_at: at(3, 18),
                    priority: None,
                },
                at(1, 9),
            )
            .expect("sooner");

        assert!(database
            .set_reminder_status("alice", &later.id, ReminderStatus::Dismissed)
            .expect("update"));

        let snapshot = database.snapshot("alice").expect("snapshot");
        assert_eq!(snapshot.reminders[0].title, "Call mom");
        assert_eq!(snapshot.reminders[1].status, ReminderStatus::Dismissed);
        assert_eq!(snapshot.reminders[1].priority, Some(Priority::Medium));
    }

    #[test]
    fn todo_timer_round_trips_through_store() {
        let (_dir, database) = open_temp();
        let todo = database
            .create_todo(
                "alice",
                &NewTodo {
                    title: "Write report".to_string(),
                    due_at: None,
                    priority: None,
                    parent_id: None,
                },
                at(1, 8),
            )
            .expect("todo");

        let started = database
            .start_todo_timer("alice", &todo.id, at(2, 9))
            .expect("start")
            .expect("owned todo");
        assert!(started.is_running());
        assert_eq!(
            database.todo("alice", &todo.id).expect("get").and_then(|todo| todo.timer),
            Some(started)
        );

        let stopped = database
            .stop_todo_timer("alice", &todo.id, at(2, 11))
            .expect("stop")
            .expect("owned todo");
        assert_eq!(stopped, TodoTimer { started_at: None, elapsed_seconds: 7200 });

        database.start_todo_timer("alice", &todo.id, at(3, 9)).expect("restart");
        database.stop_todo_timer("alice", &todo.id, at(3, 10)).expect("stop again");

        let stored = database.todos("alice").expect("list");
        assert_eq!(stored[0].timer.as_ref().map(|timer| timer.elapsed_seconds), Some(10_800));
        assert!(!stored[0].timer.as_ref().is_some_and(TodoTimer::is_running));
    }

    #[test]
    fn todo_timer_is_scoped_and_pending_only() {
        let (_dir, database) = open_temp();
        let todo = database
            .create_todo(
                "alice",
                &NewTodo {
                    title: "Done already".to_string(),
                    due_at: None,
                    priority: None,
                    parent_id: None,
                },
                at(1, 8),
            )
            .expect("todo");

        assert!(database.start_todo_timer("bob", &todo.id, at(2, 9)).expect("lookup").is_none());
        assert!(database.stop_todo_timer("alice", "missing", at(2, 9)).expect("lookup").is_none());

        database
            .set_todo_status("alice", &todo.id, TodoStatus::Completed)
            .expect("complete");
        assert!(database.start_todo_timer("alice", &todo.id, at(2, 9)).is_err());
    }
}
