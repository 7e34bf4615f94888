//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    response::Json,
};
use tracing::info;

use crate::state::{AppError, AppState};
use super::responses::{ApiResponse, HealthResponse, SessionView, StatusResponse};

/// Handle POST /start - Start a new session
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.start()?;
    info!("Start endpoint called - stopwatch running");
    Ok(Json(ApiResponse::new("Stopwatch started".to_string(), &snapshot)))
}

/// Handle POST /lap - Split the current lap
pub async fn lap_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.lap()?;
    // The first row is the lap that just opened
    let current = snapshot.laps.first().map_or(0, |lap| lap.number);
    info!("Lap endpoint called - {} laps completed", current.saturating_sub(1));
    Ok(Json(ApiResponse::new(format!("Lap {} started", current), &snapshot)))
}

/// Handle POST /stop - Pause the stopwatch
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.stop()?;
    info!("Stop endpoint called - stopwatch stopped at {}ms", snapshot.elapsed_ms);
    Ok(Json(ApiResponse::new("Stopwatch stopped".to_string(), &snapshot)))
}

/// Handle POST /resume - Continue a stopped stopwatch
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.resume()?;
    info!("Resume endpoint called - stopwatch running");
    Ok(Json(ApiResponse::new("Stopwatch resumed".to_string(), &snapshot)))
}

/// Handle POST /reset - Clear all laps
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.reset()?;
    info!("Reset endpoint called - stopwatch idle");
    Ok(Json(ApiResponse::new("Stopwatch reset".to_string(), &snapshot)))
}

/// Handle GET /status - Return the latest session snapshot
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        session: SessionView::from(&snapshot),
        tick_interval_ms: u64::try_from(state.tick_interval.as_millis()).unwrap_or(u64::MAX),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
