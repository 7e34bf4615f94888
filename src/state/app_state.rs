//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{Clock, Event, SessionSnapshot, Status, TimerSession, TransitionError};

/// Errors raised while applying an event to the shared session
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Failed to lock session: {0}")]
    LockPoisoned(String),
}

/// Main application state that owns the stopwatch session
#[derive(Debug)]
pub struct AppState {
    /// The single stopwatch session; every event goes through this lock
    pub session: Arc<Mutex<TimerSession>>,
    /// Cadence of the tick driver
    pub tick_interval: Duration,
    /// Monotonic clock, also used for uptime
    pub clock: Clock,
    /// Server metadata
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<Event>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Status after every user action, consumed by the tick driver
    pub status_change_tx: broadcast::Sender<Status>,
    /// Latest display snapshot
    pub snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl AppState {
    /// Create a new AppState with an idle session
    pub fn new(port: u16, host: String, tick_interval: Duration) -> Self {
        let (status_change_tx, _) = broadcast::channel(100);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        Self {
            session: Arc::new(Mutex::new(TimerSession::new())),
            tick_interval,
            clock: Clock::new(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            status_change_tx,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Start a fresh session
    pub fn start(&self) -> Result<SessionSnapshot, AppError> {
        self.apply_action(Event::Start, |session, now| session.start(now))
    }

    /// Split the current lap
    pub fn lap(&self) -> Result<SessionSnapshot, AppError> {
        self.apply_action(Event::Lap, |session, now| {
            let finished = session.lap(now)?;
            debug!("Lap finished after {}ms", finished);
            Ok(())
        })
    }

    /// Pause the session
    pub fn stop(&self) -> Result<SessionSnapshot, AppError> {
        self.apply_action(Event::Stop, |session, now| session.stop(now))
    }

    /// Continue a stopped session
    pub fn resume(&self) -> Result<SessionSnapshot, AppError> {
        self.apply_action(Event::Resume, |session, now| session.resume(now))
    }

    /// Discard all laps and return to idle
    pub fn reset(&self) -> Result<SessionSnapshot, AppError> {
        self.apply_action(Event::Reset, |session, _| session.reset())
    }

    /// Sample the clock into the running session and publish a fresh snapshot
    pub fn tick(&self) -> Result<SessionSnapshot, AppError> {
        self.apply(|session, now| session.tick(now), |snapshot| self.publish(snapshot.clone()))
    }

    /// Apply a user action and notify listeners
    fn apply_action<F>(&self, event: Event, op: F) -> Result<SessionSnapshot, AppError>
    where
        F: FnOnce(&mut TimerSession, u64) -> Result<(), TransitionError>,
    {
        let result = self.apply(op, |snapshot| {
            info!("Applied {}: status={}, elapsed={}ms", event, snapshot.status, snapshot.elapsed_ms);

            // Update last action tracking
            if let Ok(mut last_action) = self.last_action.lock() {
                *last_action = Some(event);
            }
            if let Ok(mut last_time) = self.last_action_time.lock() {
                *last_time = Some(Utc::now());
            }

            self.publish(snapshot.clone());

            // Notify the tick driver
            if let Err(e) = self.status_change_tx.send(snapshot.status) {
                debug!("No status listeners: {}", e);
            }
        });

        if let Err(e) = &result {
            warn!("Rejected {}: {}", event, e);
        }
        result
    }

    /// Run `op` on the session, then `notify` with the new snapshot.
    ///
    /// Both run under the session lock, so snapshots and status changes are
    /// published in the same order the events were applied.
    fn apply<F, N>(&self, op: F, notify: N) -> Result<SessionSnapshot, AppError>
    where
        F: FnOnce(&mut TimerSession, u64) -> Result<(), TransitionError>,
        N: FnOnce(&SessionSnapshot),
    {
        let mut session = self.session.lock()
            .map_err(|e| AppError::LockPoisoned(e.to_string()))?;

        // Read the clock under the lock so events are applied in time order
        let now = self.now_ms();
        op(&mut *session, now)?;

        let snapshot = session.snapshot();
        notify(&snapshot);
        Ok(snapshot)
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        if let Err(e) = self.snapshot_tx.send(snapshot) {
            warn!("Failed to publish session snapshot: {}", e);
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Current session status
    pub fn status(&self) -> Result<Status, AppError> {
        self.session.lock()
            .map(|session| session.status())
            .map_err(|e| AppError::LockPoisoned(e.to_string()))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.clock.origin().elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<Event>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| *a);
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(0, "127.0.0.1".to_string(), Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_publish_snapshots() {
        let state = state();
        let mut status_rx = state.status_change_tx.subscribe();

        state.start().unwrap();
        assert_eq!(status_rx.recv().await.unwrap(), Status::Running);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        state.lap().unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        let snapshot = state.stop().unwrap();
        assert_eq!(status_rx.recv().await.unwrap(), Status::Running);
        assert_eq!(status_rx.recv().await.unwrap(), Status::Stopped);

        assert_eq!(snapshot.elapsed_ms, 1_500);
        assert_eq!(state.snapshot(), snapshot);

        let (last_action, last_time) = state.get_last_action();
        assert_eq!(last_action, Some(Event::Stop));
        assert!(last_time.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_action_keeps_last_action() {
        let state = state();
        let err = state.lap().unwrap_err();
        assert!(matches!(
            err,
            AppError::Transition(TransitionError::InvalidStateTransition {
                event: Event::Lap,
                status: Status::Idle,
            })
        ));
        assert_eq!(state.get_last_action(), (None, None));
        assert_eq!(state.status().unwrap(), Status::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_refreshes_snapshot_only_while_running() {
        let state = state();
        assert!(state.tick().is_err());

        state.start().unwrap();
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(state.snapshot().elapsed_ms, 0);

        let snapshot = state.tick().unwrap();
        assert_eq!(snapshot.elapsed_ms, 250);
        assert_eq!(state.snapshot().elapsed_ms, 250);
        assert_eq!(state.get_last_action().0, Some(Event::Start));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_ticks_never_outlive_stop() {
        for _ in 0..200 {
            let state = Arc::new(state());
            state.start().unwrap();

            let ticker = Arc::clone(&state);
            let handle = tokio::task::spawn_blocking(move || {
                while ticker.tick().is_ok() {}
            });

            std::thread::yield_now();
            let stopped = state.stop().unwrap();
            handle.await.unwrap();

            assert_eq!(state.snapshot(), stopped);
            assert_eq!(state.snapshot().status, Status::Stopped);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_published_snapshot_matches_session_under_contention() {
        let state = Arc::new(state());
        state.start().unwrap();

        let ticker = Arc::clone(&state);
        let handle = tokio::task::spawn_blocking(move || {
            for _ in 0..5_000 {
                let _ = ticker.tick();
            }
        });

        for _ in 0..100 {
            state.lap().unwrap();
            state.stop().unwrap();
            state.resume().unwrap();
        }
        state.stop().unwrap();
        handle.await.unwrap();

        let session = state.session.lock().unwrap().snapshot();
        assert_eq!(state.snapshot(), session);
        assert_eq!(session.laps.len(), 101);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uptime_format() {
        let state = state();
        assert_eq!(state.get_uptime(), "0s");
        tokio::time::advance(Duration::from_secs(3_725)).await;
        assert_eq!(state.get_uptime(), "1h 2m 5s");
    }
}
