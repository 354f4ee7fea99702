//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use chrono::{Local, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{CompanionError, Result},
    state::{
        recipes::Temperature, Alarm, AlarmDraft, AlarmPreset, AppState, Recipe, RecipeDraft,
        ScaledRecipe, Settings, Split, StopwatchReading, TemperatureUnit, TimerPreset, TimerView,
        ALARM_PRESETS, TIMER_PRESETS,
    },
    utils::{
        conversions::pan_adjustment,
        convert, cups_to_grams, format_time, format_time_with_milliseconds,
        scale_ingredient_line, scale_recipe,
        time_format::try_parse_time_string,
        Unit,
    },
};
use super::responses::{ok, ApiError, ApiResult, EngineSummary, HealthResponse, StatusResponse};

// ---- Health and status ----

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn summarize(state: &AppState) -> Result<EngineSummary> {
    let (timers, running_timers) = {
        let board = state.timers()?;
        (board.list().len(), board.running_count())
    };
    let stopwatch = format!("{:?}", state.stopwatch()?.phase()).to_lowercase();
    let (alarms, enabled_alarms, pending_alarms) = {
        let book = state.alarms()?;
        (book.list().len(), book.enabled_count(), book.pending().len())
    };
    let recipes = state.recipes()?.list(false, None).len();

    Ok(EngineSummary {
        timers,
        running_timers,
        stopwatch,
        alarms,
        enabled_alarms,
        pending_alarms,
        recipes,
    })
}

/// Handle GET /status - Engine counts, advisories and server info
pub async fn status_handler(State(state): State<Arc<AppState>>) -> std::result::Result<Json<StatusResponse>, ApiError> {
    let engines = summarize(&state)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        engines,
        advisories: state.advisories(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

// ---- Timers ----

#[derive(Debug, Deserialize)]
pub struct CreateTimerRequest {
    #[serde(default)]
    pub label: String,
    /// Seconds
    pub duration: Option<i64>,
    /// `MM:SS` or `HH:MM:SS`, used when `duration` is absent
    pub time: Option<String>,
}

impl CreateTimerRequest {
    fn duration_seconds(&self) -> Result<i64> {
        match (&self.duration, &self.time) {
            (Some(seconds), _) => Ok(*seconds),
            (None, Some(text)) => Ok((try_parse_time_string(text)? / 1000) as i64),
            (None, None) => Err(CompanionError::InvalidDuration(
                "either duration or time is required".to_string(),
            )),
        }
    }
}

/// Handle GET /timers - List timers with their live remaining time
pub async fn list_timers_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TimerView>> {
    let views = state.timers()?.views(Utc::now());
    ok(format!("{} timers", views.len()), views)
}

/// Handle POST /timers - Create an idle timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> ApiResult<TimerView> {
    let seconds = request.duration_seconds()?;
    let now = Utc::now();
    let view = state.update_timers("timer-create", |board| {
        let timer = board.create(&request.label, seconds, now)?;
        board.view(timer.id, now)
    })?;
    ok("Timer created", view)
}

/// Handle GET /timers/presets - Quick-start timer presets
pub async fn timer_presets_handler() -> ApiResult<&'static [TimerPreset]> {
    ok("Timer presets", TIMER_PRESETS)
}

/// Handle POST /timers/presets/:key - Create a timer from a preset
pub async fn create_timer_from_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<TimerView> {
    let now = Utc::now();
    let view = state.update_timers("timer-preset", |board| {
        let timer = board.create_from_preset(&key, now)?;
        board.view(timer.id, now)
    })?;
    ok("Timer created from preset", view)
}

/// Handle GET /timers/:id
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TimerView> {
    let view = state.timers()?.view(id, Utc::now())?;
    ok("Timer", view)
}

/// Handle DELETE /timers/:id
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    state.update_timers("timer-delete", |board| board.delete(id))?;
    ok("Timer deleted", id)
}

/// Timer transitions reachable over POST /timers/:id/:action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Reset,
}

/// Handle POST /timers/:id/:action - start, pause, resume or reset
pub async fn timer_action_handler(
    State(state): State<Arc<AppState>>,
    Path((id, action)): Path<(Uuid, TimerAction)>,
) -> ApiResult<TimerView> {
    let now = Utc::now();
    let name = format!("timer-{:?}", action).to_lowercase();
    let view = state.update_timers(&name, |board| {
        match action {
            TimerAction::Start => board.start(id, now)?,
            TimerAction::Pause => board.pause(id, now)?,
            TimerAction::Resume => board.resume(id, now)?,
            TimerAction::Reset => board.reset(id)?,
        };
        board.view(id, now)
    })?;
    ok(format!("Timer {:?}", view.phase).to_lowercase(), view)
}

/// Handle GET /timers/live - Server-sent timer views, once per tick
pub async fn timers_live_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(watch_events("timers", state.timer_update_tx.subscribe()))
        .keep_alive(KeepAlive::default())
}

// ---- Stopwatch ----

#[derive(Debug, Serialize)]
pub struct StopwatchSnapshot {
    pub reading: StopwatchReading,
    pub splits: Vec<Split>,
}

fn stopwatch_snapshot(state: &AppState) -> Result<StopwatchSnapshot> {
    let stopwatch = state.stopwatch()?;
    Ok(StopwatchSnapshot {
        reading: stopwatch.reading(Utc::now()),
        splits: stopwatch.splits().to_vec(),
    })
}

/// Handle GET /stopwatch - Current reading and splits
pub async fn stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<StopwatchSnapshot> {
    ok("Stopwatch", stopwatch_snapshot(&state)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchAction {
    Start,
    Pause,
    Resume,
    Reset,
}

/// Handle POST /stopwatch/:action - start, pause, resume or reset
pub async fn stopwatch_action_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<StopwatchAction>,
) -> ApiResult<StopwatchSnapshot> {
    let name = format!("stopwatch-{:?}", action).to_lowercase();
    let phase = state.update_stopwatch(&name, |stopwatch| {
        let now = Utc::now();
        match action {
            StopwatchAction::Start => stopwatch.start(now),
            StopwatchAction::Pause => stopwatch.pause(now),
            StopwatchAction::Resume => stopwatch.resume(now),
            StopwatchAction::Reset => stopwatch.reset(),
        }
    })?;
    ok(format!("Stopwatch {:?}", phase).to_lowercase(), stopwatch_snapshot(&state)?)
}

/// Handle POST /stopwatch/split - Record a lap
pub async fn stopwatch_split_handler(State(state): State<Arc<AppState>>) -> ApiResult<Option<Split>> {
    let split = state.update_stopwatch("stopwatch-split", |stopwatch| {
        stopwatch.record_split(Utc::now())
    })?;
    let message = if split.is_some() {
        "Split recorded"
    } else {
        "Stopwatch is not running, no split recorded"
    };
    ok(message, split)
}

/// Handle GET /stopwatch/splits/report - Plain-text lap table
pub async fn stopwatch_report_handler(State(state): State<Arc<AppState>>) -> std::result::Result<String, ApiError> {
    Ok(state.stopwatch()?.splits_report())
}

/// Handle GET /stopwatch/live - Server-sent stopwatch readings
pub async fn stopwatch_live_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(watch_events("reading", state.stopwatch_reading_tx.subscribe()))
        .keep_alive(KeepAlive::default())
}

// ---- Alarms ----

/// Handle GET /alarms
pub async fn list_alarms_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Alarm>> {
    let alarms = state.alarms()?.list();
    ok(format!("{} alarms", alarms.len()), alarms)
}

/// Handle POST /alarms - Create an alarm
pub async fn create_alarm_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<AlarmDraft>,
) -> ApiResult<Alarm> {
    let alarm = state.update_alarms("alarm-create", |book| book.create(draft))?;
    ok("Alarm created", alarm)
}

/// Handle GET /alarms/presets
pub async fn alarm_presets_handler() -> ApiResult<&'static [AlarmPreset]> {
    ok("Alarm presets", ALARM_PRESETS)
}

/// Handle POST /alarms/presets/:id - Alarm a preset number of minutes from now
pub async fn create_alarm_from_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(preset): Path<String>,
) -> ApiResult<Alarm> {
    let now = Local::now().naive_local();
    let alarm = state.update_alarms("alarm-preset", |book| book.create_from_preset(&preset, now))?;
    ok("Alarm created from preset", alarm)
}

/// Handle GET /alarms/pending - Fired alarms awaiting dismiss or snooze
pub async fn pending_alarms_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Alarm>> {
    let pending = state.alarms()?.pending();
    ok(format!("{} pending", pending.len()), pending)
}

/// Handle PUT /alarms/:id - Replace an alarm's settings
pub async fn update_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(draft): Json<AlarmDraft>,
) -> ApiResult<Alarm> {
    let alarm = state.update_alarms("alarm-update", |book| book.update(id, draft))?;
    ok("Alarm updated", alarm)
}

/// Handle DELETE /alarms/:id
pub async fn delete_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    state.update_alarms("alarm-delete", |book| book.delete(id))?;
    ok("Alarm deleted", id)
}

/// Handle POST /alarms/:id/toggle
pub async fn toggle_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Alarm> {
    let alarm = state.update_alarms("alarm-toggle", |book| book.toggle(id))?;
    let message = if alarm.enabled { "Alarm enabled" } else { "Alarm disabled" };
    ok(message, alarm)
}

#[derive(Debug, Default, Deserialize)]
pub struct SnoozeRequest {
    /// Defaults to the alarm's own snooze duration
    pub minutes: Option<i64>,
}

/// Handle POST /alarms/:id/snooze - Create a one-time follow-up alarm
pub async fn snooze_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<SnoozeRequest>>,
) -> ApiResult<Alarm> {
    let minutes = body.and_then(|Json(request)| request.minutes);
    let now = Local::now().naive_local();
    let snoozed = state.update_alarms("alarm-snooze", |book| book.snooze(id, minutes, now))?;
    info!("Alarm {} snoozed until {}", id, snoozed.time);
    ok(format!("Snoozed until {}", snoozed.time), snoozed)
}

/// Handle POST /alarms/:id/dismiss
pub async fn dismiss_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<bool> {
    let dismissed = state.update_alarms("alarm-dismiss", |book| {
        book.get(id)?;
        Ok(book.dismiss(id))
    })?;
    let message = if dismissed { "Alarm dismissed" } else { "Alarm was not ringing" };
    ok(message, dismissed)
}

// ---- Conversions and formatting ----

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: f64,
    pub unit: Unit,
}

/// Handle POST /convert - Weight or volume conversion
pub async fn convert_handler(Json(request): Json<ConvertRequest>) -> ApiResult<Quantity> {
    let from: Unit = request.from.parse()?;
    let to: Unit = request.to.parse()?;
    let amount = convert(request.amount, from, to)?;
    ok(format!("{} {} = {} {}", request.amount, from, amount, to), Quantity { amount, unit: to })
}

#[derive(Debug, Deserialize)]
pub struct TemperatureRequest {
    pub value: f64,
    pub unit: TemperatureUnit,
}

/// Handle POST /convert/temperature - Both scales for one reading
pub async fn temperature_handler(Json(request): Json<TemperatureRequest>) -> ApiResult<Temperature> {
    if !request.value.is_finite() {
        return Err(CompanionError::InvalidQuantity("temperature must be a number".into()).into());
    }
    let temperature = Temperature::from_reading(request.value, request.unit);
    ok(
        format!("{}°C = {}°F", temperature.celsius, temperature.fahrenheit),
        temperature,
    )
}

#[derive(Debug, Deserialize)]
pub struct CupsRequest {
    pub ingredient: String,
    pub cups: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CupsResponse {
    pub ingredient: String,
    pub cups: f64,
    pub grams: Option<i64>,
}

/// Handle POST /convert/cups-to-grams - Weight estimate for known ingredients
pub async fn cups_to_grams_handler(Json(request): Json<CupsRequest>) -> ApiResult<CupsResponse> {
    let grams = cups_to_grams(&request.ingredient, request.cups);
    let message = match grams {
        Some(g) => format!("{} cups {} ≈ {} g", request.cups, request.ingredient, g),
        None => format!("No weight estimate for {}", request.ingredient),
    };
    ok(
        message,
        CupsResponse {
            ingredient: request.ingredient,
            cups: request.cups,
            grams,
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub amount: f64,
    pub factor: f64,
}

/// Handle POST /convert/scale - Multiply an amount, rounded to hundredths
pub async fn scale_handler(Json(request): Json<ScaleRequest>) -> ApiResult<f64> {
    ok("Scaled", scale_recipe(request.amount, request.factor))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanRequest {
    pub from_area: f64,
    pub to_area: f64,
}

/// Handle POST /convert/pan - Multiplier for moving a recipe between pans
pub async fn pan_handler(Json(request): Json<PanRequest>) -> ApiResult<f64> {
    ok("Pan adjustment", pan_adjustment(request.from_area, request.to_area)?)
}

#[derive(Debug, Deserialize)]
pub struct IngredientLineRequest {
    pub line: String,
    pub factor: f64,
}

/// Handle POST /convert/ingredient-line - Scale a free-text ingredient line
pub async fn ingredient_line_handler(Json(request): Json<IngredientLineRequest>) -> ApiResult<String> {
    ok("Scaled", scale_ingredient_line(&request.line, request.factor))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRequest {
    pub milliseconds: f64,
    #[serde(default)]
    pub with_milliseconds: bool,
}

/// Handle POST /time/format - Render a duration for display
pub async fn format_time_handler(Json(request): Json<FormatRequest>) -> ApiResult<String> {
    if !request.milliseconds.is_finite() || request.milliseconds < 0.0 {
        return Err(CompanionError::InvalidDuration(format!(
            "cannot format {} milliseconds",
            request.milliseconds
        ))
        .into());
    }
    let milliseconds = request.milliseconds as u64;
    let text = if request.with_milliseconds {
        format_time_with_milliseconds(milliseconds)
    } else {
        format_time(milliseconds)
    };
    ok("Formatted", text)
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParsedTime {
    pub milliseconds: u64,
    pub valid: bool,
}

/// Handle POST /time/parse - `MM:SS` or `HH:MM:SS` to milliseconds.
/// Malformed input parses to zero with `valid: false`.
pub async fn parse_time_handler(Json(request): Json<ParseRequest>) -> ApiResult<ParsedTime> {
    let parsed = match try_parse_time_string(&request.text) {
        Ok(milliseconds) => ParsedTime { milliseconds, valid: true },
        Err(_) => ParsedTime { milliseconds: 0, valid: false },
    };
    ok("Parsed", parsed)
}

// ---- Recipes ----

#[derive(Debug, Default, Deserialize)]
pub struct RecipeFilter {
    #[serde(default)]
    pub favorites: bool,
    pub tag: Option<String>,
}

/// Handle GET /recipes?favorites=true&tag=holiday
pub async fn list_recipes_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RecipeFilter>,
) -> ApiResult<Vec<Recipe>> {
    let recipes = state.recipes()?.list(filter.favorites, filter.tag.as_deref());
    ok(format!("{} recipes", recipes.len()), recipes)
}

/// Handle POST /recipes
pub async fn create_recipe_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<RecipeDraft>,
) -> ApiResult<Recipe> {
    let recipe = state.update_recipes("recipe-add", |book| book.add(draft))?;
    ok("Recipe added", recipe)
}

/// Handle GET /recipes/:id
pub async fn get_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Recipe> {
    let recipe = state.recipes()?.get(id)?.clone();
    ok("Recipe", recipe)
}

/// Handle PUT /recipes/:id
pub async fn update_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(draft): Json<RecipeDraft>,
) -> ApiResult<Recipe> {
    let recipe = state.update_recipes("recipe-update", |book| book.update(id, draft))?;
    ok("Recipe updated", recipe)
}

/// Handle DELETE /recipes/:id
pub async fn delete_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    state.update_recipes("recipe-delete", |book| book.delete(id))?;
    ok("Recipe deleted", id)
}

/// Handle POST /recipes/:id/favorite
pub async fn favorite_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Recipe> {
    let recipe = state.update_recipes("recipe-favorite", |book| book.toggle_favorite(id))?;
    ok("Favorite toggled", recipe)
}

/// Handle POST /recipes/:id/baked
pub async fn baked_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Recipe> {
    let recipe = state.update_recipes("recipe-baked", |book| book.mark_baked(id, Utc::now()))?;
    ok("Marked as baked", recipe)
}

#[derive(Debug, Deserialize)]
pub struct ScaleQuery {
    pub factor: f64,
}

/// Handle GET /recipes/:id/scaled?factor=2
pub async fn scaled_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ScaleQuery>,
) -> ApiResult<ScaledRecipe> {
    let scaled = state.recipes()?.scaled(id, query.factor)?;
    ok(format!("Scaled {}×", query.factor), scaled)
}

// ---- Settings ----

/// Handle GET /settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> ApiResult<Settings> {
    ok("Settings", state.settings()?)
}

/// Handle PUT /settings - Replace all settings
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> ApiResult<Settings> {
    ok("Settings updated", state.update_settings(settings)?)
}

// ---- Events ----

fn sse_json<T: Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| Event::default().comment(format!("unserializable {}: {}", name, e)))
}

/// The current value of a watch channel, then every change
fn watch_events<T>(
    name: &'static str,
    rx: watch::Receiver<T>,
) -> impl Stream<Item = std::result::Result<Event, Infallible>>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    let current = rx.borrow().clone();

    let updates = stream::unfold(rx, |mut rx| async move {
        rx.changed().await.ok()?;
        let value = rx.borrow_and_update().clone();
        Some((value, rx))
    });

    stream::once(async move { current })
        .chain(updates)
        .map(move |value| Ok(sse_json(name, &value)))
}

/// Handle GET /events - Timer completions, alarm firings and stopwatch
/// transitions as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok(sse_json(event.name(), &event)), rx)),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Event subscriber lagged, {} events dropped", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
