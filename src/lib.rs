//! Lapwatch - A state-managed HTTP stopwatch with lap tracking
//! 
//! This library provides the stopwatch session state machine, the shared
//! application state around it, the tick driver that refreshes it, and the
//! HTTP API that exposes it.

pub mod config;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerSession};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
