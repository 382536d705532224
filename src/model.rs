use crate::dates::local_date;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    #[default]
    Builder,
    Quitter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Raw weekday tokens as stored. Empty means every day.
    pub recurrence: Vec<String>,
    pub kind: HabitKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub id: String,
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    #[default]
    Pending,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Stopwatch attached to a todo. `elapsed_seconds` holds finished segments only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTimer {
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
}

impl TodoTimer {
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total seconds, counting a running segment up to `now`.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        let running = self
            .started_at
            .map(|started| now.signed_duration_since(started).num_seconds().max(0) as u64)
            .unwrap_or_default();

        self.elapsed_seconds.saturating_add(running)
    }

    /// Starting an already running timer keeps the original start.
    pub fn start(&self, now: DateTime<Utc>) -> Self {
        Self {
            started_at: Some(self.started_at.unwrap_or(now)),
            elapsed_seconds: self.elapsed_seconds,
        }
    }

    pub fn stop(&self, now: DateTime<Utc>) -> Self {
        Self {
            started_at: None,
            elapsed_seconds: self.elapsed_at(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub status: TodoStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub parent_id: Option<String>,
    pub timer: Option<TodoTimer>,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Calendar day the todo belongs to: its due day, or its creation day.
    pub fn anchor_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        local_date(self.due_at.as_ref().unwrap_or(&self.created_at), tz)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TodoStatus::Completed
    }

    pub fn is_overdue<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> bool {
        self.status == TodoStatus::Pending
            && self
                .due_at
                .as_ref()
                .is_some_and(|due| local_date(due, tz) < today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Completed,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub remind_at: DateTime<Utc>,
    pub status: ReminderStatus,
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_completed(&self) -> bool {
        self.status == ReminderStatus::Completed
    }
}

impl HabitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builder => "builder",
            Self::Quitter => "quitter",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "builder" | "build" => Some(Self::Builder),
            "quitter" | "quit" => Some(Self::Quitter),
            _ => None,
        }
    }
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" | "done" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" | "done" => Some(Self::Completed),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
