//! State management module
//! 
//! This module contains the stopwatch session, the clock that feeds it, and
//! the shared application state that serializes access to both.

pub mod session;
pub mod clock;
pub mod app_state;

// Re-export main types
pub use session::{
    Event, LapEntry, LapExtremes, SessionSnapshot, Status, TimerSession, TransitionError,
};
pub use clock::Clock;
pub use app_state::{AppError, AppState};
