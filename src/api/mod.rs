//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;
pub use responses::{ApiError, ApiResponse};

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        // Timers
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route("/timers/live", get(timers_live_handler))
        .route("/timers/presets", get(timer_presets_handler))
        .route("/timers/presets/:key", post(create_timer_from_preset_handler))
        .route("/timers/:id", get(get_timer_handler).delete(delete_timer_handler))
        .route("/timers/:id/:action", post(timer_action_handler))
        // Stopwatch
        .route("/stopwatch", get(stopwatch_handler))
        .route("/stopwatch/live", get(stopwatch_live_handler))
        .route("/stopwatch/split", post(stopwatch_split_handler))
        .route("/stopwatch/splits/report", get(stopwatch_report_handler))
        .route("/stopwatch/:action", post(stopwatch_action_handler))
        // Alarms
        .route("/alarms", get(list_alarms_handler).post(create_alarm_handler))
        .route("/alarms/presets", get(alarm_presets_handler))
        .route("/alarms/presets/:preset", post(create_alarm_from_preset_handler))
        .route("/alarms/pending", get(pending_alarms_handler))
        .route(
            "/alarms/:id",
            put(update_alarm_handler).delete(delete_alarm_handler),
        )
        .route("/alarms/:id/toggle", post(toggle_alarm_handler))
        .route("/alarms/:id/snooze", post(snooze_alarm_handler))
        .route("/alarms/:id/dismiss", post(dismiss_alarm_handler))
        // Conversions and formatting
        .route("/convert", post(convert_handler))
        .route("/convert/temperature", post(temperature_handler))
        .route("/convert/cups-to-grams", post(cups_to_grams_handler))
        .route("/convert/scale", post(scale_handler))
        .route("/convert/pan", post(pan_handler))
        .route("/convert/ingredient-line", post(ingredient_line_handler))
        .route("/time/format", post(format_time_handler))
        .route("/time/parse", post(parse_time_handler))
        // Recipes
        .route("/recipes", get(list_recipes_handler).post(create_recipe_handler))
        .route(
            "/recipes/:id",
            get(get_recipe_handler)
                .put(update_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route("/recipes/:id/favorite", post(favorite_recipe_handler))
        .route("/recipes/:id/baked", post(baked_recipe_handler))
        .route("/recipes/:id/scaled", get(scaled_recipe_handler))
        // Settings
        .route("/settings", get(get_settings_handler).put(update_settings_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
