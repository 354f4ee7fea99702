use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bake_companion::{create_router, AppState, Collaborators};

fn app() -> Router {
    let state = AppState::new(20554, "127.0.0.1".into(), Collaborators::in_memory());
    create_router(Arc::new(state))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn timer_lifecycle_over_http() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/timers",
        Some(json!({ "label": "Cookies", "duration": 600 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phase"], "idle");
    assert_eq!(body["data"]["display"], "10:00");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = call(&app, Method::POST, &format!("/timers/{}/start", id), None).await;
    assert_eq!(body["data"]["phase"], "running");
    let (_, body) = call(&app, Method::POST, &format!("/timers/{}/pause", id), None).await;
    assert_eq!(body["data"]["phase"], "paused");
    let (_, body) = call(&app, Method::POST, &format!("/timers/{}/reset", id), None).await;
    assert_eq!(body["data"]["remaining"], 600);

    let (_, body) = call(&app, Method::GET, "/timers", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/timers/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, &format!("/timers/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn timers_accept_clock_strings_and_presets() {
    let app = app();

    let (_, body) = call(&app, Method::POST, "/timers", Some(json!({ "time": "1:30" }))).await;
    assert_eq!(body["data"]["duration"], 90);
    assert_eq!(body["data"]["label"], "Timer");

    let (status, body) = call(&app, Method::POST, "/timers/presets/bread-rise", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display"], "1:00:00");

    let (status, _) = call(&app, Method::POST, "/timers", Some(json!({ "duration": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, Method::POST, "/timers/presets/souffle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stopwatch_records_splits_only_while_running() {
    let app = app();

    let (_, body) = call(&app, Method::POST, "/stopwatch/split", None).await;
    assert!(body["data"].is_null());

    let (_, body) = call(&app, Method::POST, "/stopwatch/start", None).await;
    assert_eq!(body["data"]["reading"]["phase"], "running");

    let (_, body) = call(&app, Method::POST, "/stopwatch/split", None).await;
    assert!(body["data"]["time"].is_u64());

    let (status, body) = call(&app, Method::GET, "/stopwatch/splits/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().starts_with("#1"));

    let (_, body) = call(&app, Method::POST, "/stopwatch/reset", None).await;
    assert_eq!(body["data"]["reading"]["display"], "0:00.00");
    assert!(body["data"]["splits"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn alarms_validate_toggle_and_snooze() {
    let app = app();

    let (status, _) = call(&app, Method::POST, "/alarms", Some(json!({ "time": "25:00" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        Method::POST,
        "/alarms",
        Some(json!({ "label": "Feed starter", "time": "07:00", "repeat": "weekdays" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = call(&app, Method::POST, &format!("/alarms/{}/toggle", id), None).await;
    assert_eq!(body["data"]["enabled"], false);

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/alarms/{}/snooze", id),
        Some(json!({ "minutes": 10 })),
    )
    .await;
    assert_eq!(body["data"]["label"], "Feed starter (snoozed)");
    assert_eq!(body["data"]["repeat"], "once");

    let (_, body) = call(&app, Method::GET, "/alarms", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = call(&app, Method::POST, &format!("/alarms/{}/dismiss", id), None).await;
    assert_eq!(body["data"], false);
}

#[tokio::test]
async fn out_of_range_numbers_are_rejected_and_engines_stay_usable() {
    let app = app();

    let (status, _) = call(
        &app,
        Method::POST,
        "/timers",
        Some(json!({ "duration": i64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(
        &app,
        Method::POST,
        "/timers",
        Some(json!({ "time": "99999999999999999:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/time/parse",
        Some(json!({ "text": "99999999999999999:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["milliseconds"], 0);

    let (_, body) = call(&app, Method::POST, "/alarms", Some(json!({ "time": "07:00" }))).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/alarms/{}/snooze", id),
        Some(json!({ "minutes": 10_000_000_000_000_000i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::GET, "/timers", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, "/alarms", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn conversions_and_formatting() {
    let app = app();

    let (_, body) = call(
        &app,
        Method::POST,
        "/convert",
        Some(json!({ "amount": 100, "from": "g", "to": "oz" })),
    )
    .await;
    assert_eq!(body["data"]["amount"], 3.53);

    let (status, _) = call(
        &app,
        Method::POST,
        "/convert",
        Some(json!({ "amount": 1, "from": "g", "to": "ml" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(
        &app,
        Method::POST,
        "/convert/temperature",
        Some(json!({ "value": 175, "unit": "celsius" })),
    )
    .await;
    assert_eq!(body["data"]["fahrenheit"], 347);

    let (_, body) = call(
        &app,
        Method::POST,
        "/convert/ingredient-line",
        Some(json!({ "line": "2 cups flour", "factor": 1.5 })),
    )
    .await;
    assert_eq!(body["data"], "3 cups flour");

    let (_, body) = call(&app, Method::POST, "/time/format", Some(json!({ "milliseconds": 90000 }))).await;
    assert_eq!(body["data"], "1:30");
    let (status, _) = call(&app, Method::POST, "/time/format", Some(json!({ "milliseconds": -5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, Method::POST, "/time/parse", Some(json!({ "text": "1:01:01" }))).await;
    assert_eq!(body["data"]["milliseconds"], 3_661_000);
    let (_, body) = call(&app, Method::POST, "/time/parse", Some(json!({ "text": "soon" }))).await;
    assert_eq!(body["data"]["milliseconds"], 0);
    assert_eq!(body["data"]["valid"], false);
}

#[tokio::test]
async fn recipes_scale_and_filter() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/recipes",
        Some(json!({
            "title": "Banana Bread",
            "category": "Bread",
            "ingredients": [
                { "name": "all-purpose flour", "amount": 2, "unit": "cup" },
                { "name": "bananas", "amount": 3, "unit": "whole" }
            ],
            "prepTime": 15,
            "bakeTime": 60,
            "temperature": { "value": 350, "unit": "fahrenheit" },
            "servings": 8
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["temperature"]["celsius"], 177);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = call(&app, Method::GET, &format!("/recipes/{}/scaled?factor=2", id), None).await;
    assert_eq!(body["data"]["servings"], 16);
    assert_eq!(body["data"]["ingredients"][0]["grams"], 500);
    assert_eq!(body["data"]["ingredients"][1]["amount"], 6.0);

    let (status, _) = call(&app, Method::GET, &format!("/recipes/{}/scaled?factor=0", id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = call(&app, Method::GET, "/recipes?favorites=true", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    call(&app, Method::POST, &format!("/recipes/{}/favorite", id), None).await;
    let (_, body) = call(&app, Method::GET, "/recipes?favorites=true", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn settings_and_status() {
    let app = app();

    let (_, body) = call(&app, Method::GET, "/settings", None).await;
    assert_eq!(body["data"]["temperatureUnit"], "fahrenheit");

    let (_, body) = call(
        &app,
        Method::PUT,
        "/settings",
        Some(json!({ "temperatureUnit": "celsius", "soundEnabled": false, "userName": "Sam" })),
    )
    .await;
    assert_eq!(body["data"]["temperatureUnit"], "celsius");
    assert_eq!(body["data"]["notificationsEnabled"], true);

    let (status, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_action"], "settings");
    assert_eq!(body["engines"]["stopwatch"], "stopped");
    assert!(body["advisories"].as_array().unwrap().is_empty());
}
