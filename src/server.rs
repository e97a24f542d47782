//! Web server exposing the introduction, goal calculator and calorie tracker.
//!
//! Provides a JSON API for each page and optional static file serving for
//! the frontend. Calorie tracker state lives in per-session food logs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

use crate::domain::{ActivityLevel, ConsumptionEntry, DailySummary, FoodReference, Macros};
use crate::error::{InputError, TrendError};
use crate::food_log::FoodSelection;
use crate::goal::{GoalError, GoalInputs, GoalPlan};
use crate::session::{DEFAULT_TARGET_CALORIES, SessionId, SessionStore};
use crate::trend::{
    CalorieChart, DEFAULT_WINDOW, SignificanceResult, calorie_chart, significance_test,
    trailing_average,
};

/// Shared application state.
pub struct AppState {
    /// Food reference table, or the reason it could not be loaded.
    pub foods: Result<FoodReference, String>,
    /// Calorie tracker sessions.
    pub sessions: RwLock<SessionStore>,
}

impl AppState {
    pub fn new(foods: Result<FoodReference, String>, sessions: SessionStore) -> Self {
        Self {
            foods,
            sessions: RwLock::new(sessions),
        }
    }

    fn foods(&self) -> Result<&FoodReference, ApiError> {
        self.foods
            .as_ref()
            .map_err(|reason| ApiError::FoodsUnavailable(reason.clone()))
    }
}

// === Error Responses ===

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(SessionId),
    FoodsUnavailable(String),
    /// Request body that is not valid JSON for the endpoint, including
    /// unknown sex or activity labels and malformed dates.
    BadBody(String),
    Input(InputError),
    Goal(GoalError),
    Trend(TrendError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadBody(rejection.body_text())
    }
}

impl From<InputError> for ApiError {
    fn from(e: InputError) -> Self {
        ApiError::Input(e)
    }
}

impl From<GoalError> for ApiError {
    fn from(e: GoalError) -> Self {
        ApiError::Goal(e)
    }
}

impl From<TrendError> for ApiError {
    fn from(e: TrendError) -> Self {
        ApiError::Trend(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "session_not_found", "message": format!("unknown session {}", id) }),
            ),
            ApiError::FoodsUnavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "food_data_missing", "message": reason }),
            ),
            ApiError::BadBody(reason) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "message": reason }),
            ),
            ApiError::Input(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "message": e.to_string() }),
            ),
            ApiError::Goal(GoalError::Input(e)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "message": e.to_string() }),
            ),
            ApiError::Goal(GoalError::Formula(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "degenerate_computation", "message": e.to_string() }),
            ),
            ApiError::Trend(e) => {
                let mut body = serde_json::to_value(e).unwrap_or_else(|_| json!({}));
                body["message"] = json!(e.to_string());
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

// === JSON Request/Response Types ===

#[derive(Serialize)]
pub struct IntroductionResponse {
    pub title: &'static str,
    pub text: &'static str,
    pub pages: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct ActivityLevelJson {
    pub id: &'static str,
    pub label: &'static str,
    pub multiplier: f64,
}

#[derive(Serialize)]
pub struct FoodsResponse {
    pub foods: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub target_calories: Option<u32>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub target_calories: f64,
}

#[derive(Deserialize)]
pub struct TargetRequest {
    pub target_calories: u32,
}

#[derive(Deserialize)]
pub struct AddFoodsRequest {
    pub date: NaiveDate,
    pub items: Vec<FoodSelection>,
}

#[derive(Serialize)]
pub struct AddFoodsResponse {
    pub written: usize,
    pub totals: Macros,
}

#[derive(Serialize)]
pub struct LogResponse {
    pub entries: Vec<ConsumptionEntry>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct DayResponse {
    pub date: NaiveDate,
    pub totals: Macros,
    pub entries: Vec<ConsumptionEntry>,
    pub breakdown: Option<Macros>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SummariesResponse {
    pub summaries: Vec<DailySummary>,
    pub chart: CalorieChart,
    pub trend_available: bool,
}

#[derive(Serialize)]
pub struct AverageResponse {
    pub window: usize,
    pub average: Macros,
}

#[derive(Serialize)]
pub struct SignificanceResponse {
    #[serde(flatten)]
    pub result: SignificanceResult,
    pub message: &'static str,
}

// === Router Setup ===

/// Creates the application router.
pub fn create_router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/api/introduction", get(get_introduction))
        .route("/api/activity-levels", get(get_activity_levels))
        .route("/api/goal", post(post_goal))
        .route("/api/foods", get(get_foods))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", delete(end_session))
        .route("/api/sessions/{id}/target", put(put_target))
        .route("/api/sessions/{id}/foods", post(add_foods))
        .route("/api/sessions/{id}/log", get(get_log))
        .route("/api/sessions/{id}/days/{date}", get(get_day))
        .route("/api/sessions/{id}/days/{date}/commit", post(commit_day))
        .route("/api/sessions/{id}/summaries", get(get_summaries))
        .route("/api/sessions/{id}/average", get(get_average))
        .route("/api/sessions/{id}/significance", get(get_significance));

    let router = match static_dir {
        Some(dir) => {
            router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => router,
    };

    router.with_state(state)
}

/// Runs the web server.
pub async fn run_server(
    state: Arc<AppState>,
    port: u16,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let app = create_router(state, static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("Server running at http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    axum::serve(listener, app).await?;

    Ok(())
}

// === Page 1: Introduction ===

/// GET /api/introduction - Welcome text.
async fn get_introduction() -> Json<IntroductionResponse> {
    Json(IntroductionResponse {
        title: "Welcome to My Health App",
        text: "This app helps you track your weight goals and calorie intake. \
               Use the navigation to switch between the Weight Goal Calculator \
               and the Calorie Intake Tracker.",
        pages: vec!["Introduction", "Weight Goal Calculator", "Calorie Intake Tracker"],
    })
}

// === Page 2: Weight Goal Calculator ===

/// GET /api/activity-levels - Options for the activity selector.
async fn get_activity_levels() -> Json<Vec<ActivityLevelJson>> {
    Json(
        ActivityLevel::all()
            .iter()
            .map(|level| ActivityLevelJson {
                id: level.id(),
                label: level.display_name(),
                multiplier: level.multiplier(),
            })
            .collect(),
    )
}

/// POST /api/goal - Compute calorie targets and time to goal.
async fn post_goal(
    payload: Result<Json<GoalInputs>, JsonRejection>,
) -> Result<Json<GoalPlan>, ApiError> {
    let Json(inputs) = payload?;
    Ok(Json(GoalPlan::compute(&inputs)?))
}

// === Page 3: Calorie Intake Tracker ===

/// GET /api/foods - Food names for the selector.
async fn get_foods(State(state): State<Arc<AppState>>) -> Result<Json<FoodsResponse>, ApiError> {
    let foods = state.foods()?;
    Ok(Json(FoodsResponse {
        foods: foods.names().map(str::to_string).collect(),
    }))
}

/// POST /api/sessions - Start a tracker session.
async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(request) = payload?;
    let target_calories = request
        .target_calories
        .map(f64::from)
        .unwrap_or(DEFAULT_TARGET_CALORIES);

    let id = state.sessions.write().await.create(target_calories)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            id,
            target_calories,
        }),
    ))
}

/// DELETE /api/sessions/:id - End a session and discard its log.
async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.write().await.end(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// PUT /api/sessions/:id/target - Change the daily calorie target.
async fn put_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(request) = payload?;
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
    session.set_target_calories(f64::from(request.target_calories))?;

    Ok(Json(SessionResponse {
        id,
        target_calories: session.target_calories(),
    }))
}

/// POST /api/sessions/:id/foods - Log selected foods for a date.
async fn add_foods(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    payload: Result<Json<AddFoodsRequest>, JsonRejection>,
) -> Result<Json<AddFoodsResponse>, ApiError> {
    let Json(request) = payload?;
    let foods = state.foods()?;
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;

    let written = session.log.add_foods(request.date, foods, &request.items)?;

    Ok(Json(AddFoodsResponse {
        written,
        totals: session.log.totals_for_date(request.date),
    }))
}

/// GET /api/sessions/:id/log - The full food log.
async fn get_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<LogResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let range = session.log.date_range();

    Ok(Json(LogResponse {
        entries: session.log.entries().cloned().collect(),
        first_date: range.map(|r| r.0),
        last_date: range.map(|r| r.1),
    }))
}

/// GET /api/sessions/:id/days/:date - Totals and nutrient breakdown for a day.
async fn get_day(
    State(state): State<Arc<AppState>>,
    Path((id, date)): Path<(SessionId, NaiveDate)>,
) -> Result<Json<DayResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let breakdown = session.log.nutrient_breakdown(date);

    Ok(Json(DayResponse {
        date,
        totals: session.log.totals_for_date(date),
        entries: session.log.entries_for_date(date).cloned().collect(),
        message: breakdown
            .is_none()
            .then(|| format!("No data available for {}", date)),
        breakdown,
    }))
}

/// POST /api/sessions/:id/days/:date/commit - Save the day's totals.
async fn commit_day(
    State(state): State<Arc<AppState>>,
    Path((id, date)): Path<(SessionId, NaiveDate)>,
) -> Result<(StatusCode, Json<DailySummary>), ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
    let summary = session.log.commit_day(date).clone();

    log::info!(
        "Session {} saved {} ({:.0} kcal)",
        id,
        date,
        summary.totals.calories
    );

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/sessions/:id/summaries - Saved days and the calorie chart.
async fn get_summaries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SummariesResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let summaries = session.log.summaries();

    Ok(Json(SummariesResponse {
        summaries: summaries.to_vec(),
        chart: calorie_chart(summaries, session.target_calories()),
        trend_available: summaries.len() >= DEFAULT_WINDOW,
    }))
}

/// GET /api/sessions/:id/average - Average of the last seven saved days.
async fn get_average(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<AverageResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let average = trailing_average(session.log.summaries(), DEFAULT_WINDOW)?;

    Ok(Json(AverageResponse {
        window: DEFAULT_WINDOW,
        average,
    }))
}

/// GET /api/sessions/:id/significance - t-test of recent intake against the target.
async fn get_significance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SignificanceResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let result = significance_test(
        session.log.summaries(),
        DEFAULT_WINDOW,
        session.target_calories(),
    )?;

    Ok(Json(SignificanceResponse {
        message: result.verdict.message(),
        result,
    }))
}
