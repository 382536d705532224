use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "habitdesk", about = "Habits, todos, reminders and a calendar in one place")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    /// Per-day summaries. Defaults to the current month grid.
    Calendar {
        /// Month as YYYY-MM
        #[arg(long, conflicts_with_all = ["from", "to"])]
        month: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    Dashboard {
        #[arg(long)]
        date: Option<String>,
    },
    /// Run the HTTP API in the foreground
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum HabitCommands {
    Add {
        title: String,
        /// Weekday tokens, e.g. Mon,Wed,Fri. Empty means every day.
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
        /// builder or quitter
        #[arg(long, default_value = "builder")]
        kind: String,
    },
    List {
        #[arg(long)]
        date: Option<String>,
    },
    Done {
        id: String,
        #[arg(long)]
        date: Option<String>,
    },
    Undo {
        id: String,
        #[arg(long)]
        date: Option<String>,
    },
    Remove {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TodoCommands {
    Add {
        title: String,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        parent: Option<String>,
    },
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    Done {
        id: String,
    },
    Archive {
        id: String,
    },
    /// Start or resume the todo's timer
    Start {
        id: String,
    },
    /// Stop the todo's timer and keep the elapsed time
    Stop {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReminderCommands {
    Add {
        title: String,
        /// Local time as "YYYY-MM-DD HH:MM"
        #[arg(long)]
        at: String,
        #[arg(long)]
        priority: Option<String>,
    },
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    Done {
        id: String,
    },
    Dismiss {
        id: String,
    },
}
