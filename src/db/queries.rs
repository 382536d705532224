pub const CREATE_HABITS: &str = r#"
CREATE TABLE IF NOT EXISTS habits (
  id          TEXT PRIMARY KEY,
  user_id     TEXT NOT NULL,
  title       TEXT NOT NULL,
  recurrence  TEXT NOT NULL DEFAULT '',
  kind        TEXT NOT NULL DEFAULT 'builder',
  created_at  INTEGER NOT NULL
);
"#;

pub const CREATE_HABIT_COMPLETIONS: &str = r#"
CREATE TABLE IF NOT EXISTS habit_completions (
  id            TEXT PRIMARY KEY,
  habit_id      TEXT NOT NULL REFERENCES habits(id),
  completed_at  INTEGER NOT NULL
);
"#;

pub const CREATE_TODOS: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
  id                 TEXT PRIMARY KEY,
  user_id            TEXT NOT NULL,
  title              TEXT NOT NULL,
  status             TEXT NOT NULL DEFAULT 'pending',
  due_at             INTEGER,
  priority           TEXT,
  parent_id          TEXT,
  timer_started_at   INTEGER,
  timer_elapsed_sec  INTEGER,
  created_at         INTEGER NOT NULL
);
"#;

pub const CREATE_REMINDERS: &str = r#"
CREATE TABLE IF NOT EXISTS reminders (
  id          TEXT PRIMARY KEY,
  user_id     TEXT NOT NULL,
  title       TEXT NOT NULL,
  remind_at   INTEGER NOT NULL,
  status      TEXT NOT NULL DEFAULT 'pending',
  priority    TEXT,
  created_at  INTEGER NOT NULL
);
"#;

pub const INDEX_HABITS_USER: &str =
    "CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id);";

pub const INDEX_COMPLETIONS_HABIT_TIME: &str = "CREATE INDEX IF NOT EXISTS idx_habit_completions_habit_time ON habit_completions(habit_id, completed_at);";

pub const INDEX_TODOS_USER: &str = "CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);";

pub const INDEX_REMINDERS_USER_TIME: &str =
    "CREATE INDEX IF NOT EXISTS idx_reminders_user_time ON reminders(user_id, remind_at);";

pub const SELECT_HABIT_COLUMNS: &str =
    "SELECT id, user_id, title, recurrence, kind, created_at FROM habits";

pub const SELECT_TODO_COLUMNS: &str = "SELECT id, user_id, title, status, due_at, priority, parent_id, timer_started_at, timer_elapsed_sec, created_at FROM todos";

pub const SELECT_REMINDER_COLUMNS: &str =
    "SELECT id, user_id, title, remind_at, status, priority, created_at FROM reminders";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_HABITS,
        CREATE_HABIT_COMPLETIONS,
        CREATE_TODOS,
        CREATE_REMINDERS,
        INDEX_HABITS_USER,
        INDEX_COMPLETIONS_HABIT_TIME,
        INDEX_TODOS_USER,
        INDEX_REMINDERS_USER_TIME,
    ]
}
