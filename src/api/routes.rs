use crate::calendar::CalendarDay;
use crate::calendar::dashboard::Dashboard;
use crate::config::Config;
use crate::dates::{DateRange, InvalidRangeError, date_key, parse_day_key};
use crate::db::{Database, NewHabit, NewReminder, NewTodo, StoreCounts};
use crate::habits::HabitProgress;
use crate::model::{Habit, Reminder, ReminderStatus, Todo, TodoStatus, TodoTimer};
use crate::service;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/habits", get(habit_list).post(habit_create))
        .route("/api/v1/habits/:id", delete(habit_delete))
        .route(
            "/api/v1/habits/:id/completions/:date",
            put(habit_mark).delete(habit_unmark),
        )
        .route("/api/v1/todos", get(todo_list).post(todo_create))
        .route("/api/v1/todos/:id/status", put(todo_status))
        .route("/api/v1/todos/:id/timer/start", put(todo_timer_start))
        .route("/api/v1/todos/:id/timer/stop", put(todo_timer_stop))
        .route("/api/v1/reminders", get(reminder_list).post(reminder_create))
        .route("/api/v1/reminders/:id/status", put(reminder_status))
        .route("/api/v1/calendar", get(calendar))
        .route("/api/v1/dashboard", get(dashboard))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    all: bool,
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    from: Option<String>,
    to: Option<String>,
    month: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdatePayload {
    status: String,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    user_id: String,
    api_port: u16,
    counts: StoreCounts,
}

#[derive(Debug, Serialize)]
struct HabitsPayload {
    date: String,
    habits: Vec<HabitProgress>,
}

#[derive(Debug, Serialize)]
struct CalendarPayload {
    from: String,
    to: String,
    days: Vec<CalendarDay>,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = Database::open(&state.config.db_path)?;

    Ok(Json(StatusPayload {
        user_id: state.config.user_id.clone(),
        api_port: state.config.api_port,
        counts: database.counts(&state.config.user_id)?,
    }))
}

async fn habit_list(
    State(state): State<ApiState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<HabitsPayload>> {
    let today = optional_date(query.date.as_deref())?;
    let database = Database::open(&state.config.db_path)?;
    let habits = service::habit_progress(&database, &state.config.user_id, today, &Local)?;

    Ok(Json(HabitsPayload {
        date: date_key(today),
        habits,
    }))
}

async fn habit_create(
    State(state): State<ApiState>,
    Json(payload): Json<NewHabit>,
) -> ApiResult<(StatusCode, Json<Habit>)> {
    require_title(&payload.title, "Habit")?;
    let database = Database::open(&state.config.db_path)?;
    let habit = database.create_habit(&state.config.user_id, &payload, Utc::now())?;
    info!(habit_id = %habit.id, "habit created via API");

    Ok((StatusCode::CREATED, Json(habit)))
}

async fn habit_delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut database = Database::open(&state.config.db_path)?;
    if !database.delete_habit(&state.config.user_id, &id)? {
        return Err(ApiError::NotFound(format!("Habit not found: {id}")));
    }

    Ok(Json(json!({ "deleted": true, "id": id })))
}

async fn habit_mark(
    State(state): State<ApiState>,
    Path((id, date)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let date = parse_date(&date)?;
    let now = Utc::now();
    service::check_completion_date(date, now.with_timezone(&Local).date_naive())
        .map_err(bad_request)?;

    let database = Database::open(&state.config.db_path)?;
    require_habit(&database, &state.config.user_id, &id)?;

    let completion =
        service::mark_habit_done(&database, &state.config.user_id, &id, date, now, &Local)?;

    Ok(Json(json!({
        "completed": true,
        "date": date_key(date),
        "completion": completion
    })))
}

async fn habit_unmark(
    State(state): State<ApiState>,
    Path((id, date)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let date = parse_date(&date)?;
    let database = Database::open(&state.config.db_path)?;
    require_habit(&database, &state.config.user_id, &id)?;

    let removed = service::unmark_habit_day(&database, &state.config.user_id, &id, date, &Local)?;

    Ok(Json(json!({
        "completed": false,
        "date": date_key(date),
        "removed": removed
    })))
}

async fn todo_list(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Todo>>> {
    let database = Database::open(&state.config.db_path)?;
    let todos = database
        .todos(&state.config.user_id)?
        .into_iter()
        .filter(|todo| query.all || todo.status != TodoStatus::Archived)
        .collect();

    Ok(Json(todos))
}

async fn todo_create(
    State(state): State<ApiState>,
    Json(payload): Json<NewTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    require_title(&payload.title, "Todo")?;
    let database = Database::open(&state.config.db_path)?;
    if let Some(parent_id) = payload.parent_id.as_deref() {
        if database.todo(&state.config.user_id, parent_id)?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Parent todo not found: {parent_id}"
            )));
        }
    }
    let todo = database.create_todo(&state.config.user_id, &payload, Utc::now())?;
    info!(todo_id = %todo.id, "todo created via API");

    Ok((StatusCode::CREATED, Json(todo)))
}

async fn todo_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdatePayload>,
) -> ApiResult<Json<Value>> {
    let status = TodoStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown todo status: {}", payload.status))
    })?;

    let database = Database::open(&state.config.db_path)?;
    if !database.set_todo_status(&state.config.user_id, &id, status)? {
        return Err(ApiError::NotFound(format!("Todo not found: {id}")));
    }

    Ok(Json(json!({ "id": id, "status": status })))
}

async fn todo_timer_start(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TodoTimer>> {
    let database = Database::open(&state.config.db_path)?;
    let todo = database
        .todo(&state.config.user_id, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Todo not found: {id}")))?;
    if todo.status != TodoStatus::Pending {
        return Err(ApiError::BadRequest(format!(
            "Cannot start a timer on a {} todo",
            todo.status.as_str()
        )));
    }

    let timer = database
        .start_todo_timer(&state.config.user_id, &id, Utc::now())?
        .ok_or_else(|| ApiError::NotFound(format!("Todo not found: {id}")))?;

    Ok(Json(timer))
}

async fn todo_timer_stop(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TodoTimer>> {
    let database = Database::open(&state.config.db_path)?;
    let timer = database
        .stop_todo_timer(&state.config.user_id, &id, Utc::now())?
        .ok_or_else(|| ApiError::NotFound(format!("Todo not found: {id}")))?;

    Ok(Json(timer))
}

async fn reminder_list(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Reminder>>> {
    let database = Database::open(&state.config.db_path)?;
    let reminders = database
        .reminders(&state.config.user_id)?
        .into_iter()
        .filter(|reminder| query.all || reminder.status == ReminderStatus::Pending)
        .collect();

    Ok(Json(reminders))
}

async fn reminder_create(
    State(state): State<ApiState>,
    Json(payload): Json<NewReminder>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    require_title(&payload.title, "Reminder")?;
    let database = Database::open(&state.config.db_path)?;
    let reminder = database.create_reminder(&state.config.user_id, &payload, Utc::now())?;
    info!(reminder_id = %reminder.id, "reminder created via API");

    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn reminder_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdatePayload>,
) -> ApiResult<Json<Value>> {
    let status = ReminderStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown reminder status: {}", payload.status))
    })?;

    let database = Database::open(&state.config.db_path)?;
    if !database.set_reminder_status(&state.config.user_id, &id, status)? {
        return Err(ApiError::NotFound(format!("Reminder not found: {id}")));
    }

    Ok(Json(json!({ "id": id, "status": status })))
}

async fn calendar(
    State(state): State<ApiState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarPayload>> {
    let today = Local::now().date_naive();
    let database = Database::open(&state.config.db_path)?;
    let user_id = state.config.user_id.as_str();

    let days = match query.month.as_deref() {
        Some(month) => {
            let (year, month) = service::parse_month(month).map_err(bad_request)?;
            let week_start = state.config.week_start_day()?;
            service::calendar_month(&database, user_id, year, month, week_start, today, &Local)?
        }
        None => {
            let range = calendar_range(query.from.as_deref(), query.to.as_deref(), today)?;
            service::calendar_range(&database, user_id, range, today, &Local)?
        }
    };

    let (from, to) = match (days.first(), days.last()) {
        (Some(first), Some(last)) => (first.day_key.clone(), last.day_key.clone()),
        _ => (date_key(today), date_key(today)),
    };

    Ok(Json(CalendarPayload { from, to, days }))
}

async fn dashboard(
    State(state): State<ApiState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Dashboard>> {
    let today = optional_date(query.date.as_deref())?;
    let database = Database::open(&state.config.db_path)?;
    let dashboard = service::dashboard(
        &database,
        &state.config.user_id,
        today,
        state.config.upcoming_days,
        &Local,
    )?;

    Ok(Json(dashboard))
}

fn require_title(title: &str, kind: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{kind} title must not be empty")));
    }

    Ok(())
}

fn require_habit(database: &Database, user_id: &str, habit_id: &str) -> ApiResult<()> {
    match database.habit(user_id, habit_id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("Habit not found: {habit_id}"))),
    }
}

fn calendar_range(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> ApiResult<DateRange> {
    let start = from.map(parse_date).transpose()?.unwrap_or(today);
    let end = to.map(parse_date).transpose()?.unwrap_or(start);
    let range = DateRange::new(start, end)?;
    service::check_calendar_range(range).map_err(bad_request)?;

    Ok(range)
}

fn optional_date(input: Option<&str>) -> ApiResult<NaiveDate> {
    Ok(input
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Local::now().date_naive()))
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    parse_day_key(input).map_err(bad_request)
}

fn bad_request(error: anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{error:#}"))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<InvalidRangeError> for ApiError {
    fn from(value: InvalidRangeError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ApiError, ApiState, CalendarQuery, calendar, calendar_range, habit_create, habit_mark,
        parse_date, todo_timer_start,
    };
    use crate::config::Config;
    use crate::dates::parse_day_key;
    use crate::db::{Database, NewHabit, NewTodo};
    use crate::model::{HabitKind, TodoStatus};
    use axum::Json;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn temp_state() -> (TempDir, ApiState, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config {
            db_path: dir.path().join("habitdesk.db"),
            ..Config::default()
        };
        let database = Database::open(&config.db_path).expect("open db");
        let state = ApiState {
            config: Arc::new(config),
        };
        (dir, state, database)
    }

    fn raw_connection(state: &ApiState) -> rusqlite::Connection {
        rusqlite::Connection::open(&state.config.db_path).expect("raw connection")
    }

    fn new_habit(title: &str) -> NewHabit {
        NewHabit {
            title: title.to_string(),
            recurrence: Vec::new(),
            kind: HabitKind::Builder,
        }
    }

    #[test]
    fn inverted_calendar_range_is_bad_request() {
        let today = parse_day_key("2024-06-05").unwrap();
        let error = calendar_range(Some("2024-06-10"), Some("2024-06-01"), today).unwrap_err();

        assert!(matches!(error, ApiError::BadRequest(_)));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn calendar_range_defaults_to_single_day() {
        let today = parse_day_key("2024-06-05").unwrap();

        let range = calendar_range(None, None, today).expect("today");
        assert_eq!((range.start(), range.end()), (today, today));

        let range = calendar_range(Some("2024-06-01"), None, today).expect("from only");
        assert_eq!(range.len_days(), 1);
    }

    #[test]
    fn oversized_calendar_range_is_bad_request() {
        let today = parse_day_key("2024-06-05").unwrap();
        let error = calendar_range(Some("2023-01-01"), Some("2024-06-05"), today).unwrap_err();

        assert!(matches!(error, ApiError::BadRequest(_)));
    }

    #[test]
    fn malformed_dates_are_bad_requests() {
        assert!(matches!(parse_date("06/05/2024"), Err(ApiError::BadRequest(_))));
        assert!(parse_date("2024-06-05").is_ok());
    }

    #[test]
    fn internal_errors_map_to_500() {
        let response = ApiError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::NotFound("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn marking_reports_bad_input_and_store_failures_apart() {
        let (_dir, state, database) = temp_state();
        let habit = database
            .create_habit(&state.config.user_id, &new_habit("Stretch"), Utc::now())
            .expect("habit");

        let future = habit_mark(
            State(state.clone()),
            Path((habit.id.clone(), "2999-01-01".to_string())),
        )
        .await;
        assert!(matches!(future, Err(ApiError::BadRequest(_))));

        let missing = habit_mark(
            State(state.clone()),
            Path(("missing".to_string(), "2024-06-05".to_string())),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        raw_connection(&state)
            .execute_batch(
                "CREATE TRIGGER reject_completions BEFORE INSERT ON habit_completions
                 BEGIN SELECT RAISE(ABORT, 'disk unavailable'); END;",
            )
            .expect("trigger");

        let failed = habit_mark(
            State(state.clone()),
            Path((habit.id.clone(), "2024-06-05".to_string())),
        )
        .await;
        assert!(matches!(failed, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn unreadable_rows_in_calendar_are_internal_errors() {
        let (_dir, state, database) = temp_state();
        database
            .create_todo(
                &state.config.user_id,
                &NewTodo {
                    title: "Broken".to_string(),
                    due_at: None,
                    priority: None,
                    parent_id: None,
                },
                Utc::now(),
            )
            .expect("todo");
        raw_connection(&state)
            .execute_batch("UPDATE todos SET created_at = 9223372036854775807")
            .expect("corrupt row");

        let result = calendar(
            State(state.clone()),
            Query(CalendarQuery {
                from: Some("2024-06-01".to_string()),
                to: Some("2024-06-07".to_string()),
                month: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn blank_titles_are_bad_requests() {
        let (_dir, state, _database) = temp_state();

        let result = habit_create(State(state), Json(new_habit("   "))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn timer_routes_follow_todo_state() {
        let (_dir, state, database) = temp_state();
        let todo = database
            .create_todo(
                &state.config.user_id,
                &NewTodo {
                    title: "Focus".to_string(),
                    due_at: None,
                    priority: None,
                    parent_id: None,
                },
                Utc::now(),
            )
            .expect("todo");

        let Json(timer) = todo_timer_start(State(state.clone()), Path(todo.id.clone()))
            .await
            .map_err(|_| "start failed")
            .expect("started");
        assert!(timer.is_running());

        database
            .set_todo_status(&state.config.user_id, &todo.id, TodoStatus::Archived)
            .expect("archive");
        let archived = todo_timer_start(State(state.clone()), Path(todo.id.clone())).await;
        assert!(matches!(archived, Err(ApiError::BadRequest(_))));

        let missing = todo_timer_start(State(state), Path("missing".to_string())).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }
}
