use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use lapwatch::{api::create_router, state::AppState};

fn app() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(0, "127.0.0.1".to_string(), Duration::from_millis(100)));
    (Arc::clone(&state), create_router(state))
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_full_lap_cycle() {
    let (_state, app) = app();

    let (code, body) = call(&app, Method::POST, "/start").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["session"]["laps"].as_array().unwrap().len(), 1);

    tokio::time::advance(Duration::from_millis(1_000)).await;
    let (code, _) = call(&app, Method::POST, "/lap").await;
    assert_eq!(code, StatusCode::OK);

    tokio::time::advance(Duration::from_millis(500)).await;
    let (code, body) = call(&app, Method::POST, "/lap").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["message"], "Lap 3 started");

    tokio::time::advance(Duration::from_millis(200)).await;
    let (code, body) = call(&app, Method::POST, "/stop").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "stopped");
    assert_eq!(body["session"]["elapsed_ms"], 1_700);
    assert_eq!(body["session"]["display"], "00:01,70");

    let laps = body["session"]["laps"].as_array().unwrap();
    let rows: Vec<(u64, u64, bool, bool, bool)> = laps
        .iter()
        .map(|l| {
            (
                l["number"].as_u64().unwrap(),
                l["duration_ms"].as_u64().unwrap(),
                l["current"].as_bool().unwrap(),
                l["fastest"].as_bool().unwrap(),
                l["slowest"].as_bool().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (3, 200, true, false, false),
            (2, 500, false, true, false),
            (1, 1_000, false, false, true),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalid_transition_is_conflict() {
    let (state, app) = app();

    let (code, body) = call(&app, Method::POST, "/lap").await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["event"], "lap");
    assert_eq!(body["status"], "idle");
    assert_eq!(body["error"], "cannot lap while idle");

    call(&app, Method::POST, "/start").await;
    let (code, body) = call(&app, Method::POST, "/reset").await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["status"], "running");

    assert_eq!(state.snapshot().laps.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_then_lap_fails() {
    let (_state, app) = app();

    call(&app, Method::POST, "/start").await;
    tokio::time::advance(Duration::from_millis(300)).await;
    call(&app, Method::POST, "/stop").await;

    let (code, body) = call(&app, Method::POST, "/reset").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "idle");
    assert_eq!(body["session"]["laps"].as_array().unwrap().len(), 0);

    let (code, _) = call(&app, Method::POST, "/lap").await;
    assert_eq!(code, StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_last_action() {
    let (_state, app) = app();

    let (code, body) = call(&app, Method::GET, "/status").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["session"]["status"], "idle");
    assert_eq!(body["last_action"], Value::Null);
    assert_eq!(body["tick_interval_ms"], 100);

    call(&app, Method::POST, "/start").await;
    tokio::time::advance(Duration::from_millis(400)).await;
    call(&app, Method::POST, "/stop").await;
    call(&app, Method::POST, "/resume").await;

    let (_, body) = call(&app, Method::GET, "/status").await;
    assert_eq!(body["session"]["status"], "running");
    assert_eq!(body["session"]["elapsed_ms"], 400);
    assert_eq!(body["last_action"], "resume");
    assert!(body["last_action_time"].is_string());
}

#[tokio::test]
async fn test_health() {
    let (_state, app) = app();
    let (code, body) = call(&app, Method::GET, "/health").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
