//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{AppError, Event, LapEntry, SessionSnapshot, Status, TransitionError},
    utils::format_lap_clock,
};

/// One lap row as the display shows it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapView {
    pub number: usize,
    pub duration_ms: u64,
    pub display: String,
    pub current: bool,
    pub fastest: bool,
    pub slowest: bool,
}

impl From<&LapEntry> for LapView {
    fn from(lap: &LapEntry) -> Self {
        Self {
            number: lap.number,
            duration_ms: lap.duration_ms,
            display: format_lap_clock(lap.duration_ms),
            current: lap.current,
            fastest: lap.fastest,
            slowest: lap.slowest,
        }
    }
}

/// Session snapshot with formatted durations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub status: Status,
    pub elapsed_ms: u64,
    pub display: String,
    pub laps: Vec<LapView>,
}

impl From<&SessionSnapshot> for SessionView {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            status: snapshot.status,
            elapsed_ms: snapshot.elapsed_ms,
            display: format_lap_clock(snapshot.elapsed_ms),
            laps: snapshot.laps.iter().map(LapView::from).collect(),
        }
    }
}

/// API response structure for stopwatch action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: Status,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionView,
}

impl ApiResponse {
    /// Create a new API response from the snapshot an action produced
    pub fn new(message: String, snapshot: &SessionSnapshot) -> Self {
        Self {
            status: snapshot.status,
            message,
            timestamp: Utc::now(),
            session: SessionView::from(snapshot),
        }
    }
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionView,
    pub tick_interval_ms: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<Event>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned by action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub event: Option<Event>,
    pub status: Option<Status>,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, event, status) = match &self {
            AppError::Transition(TransitionError::InvalidStateTransition { event, status }) => {
                (StatusCode::CONFLICT, Some(*event), Some(*status))
            }
            AppError::LockPoisoned(_) => (StatusCode::INTERNAL_SERVER_ERROR, None, None),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            event,
            status,
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
