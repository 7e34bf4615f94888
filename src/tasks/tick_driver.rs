//! Periodic tick background task

use std::sync::Arc;
use tokio::{
    sync::broadcast::error::RecvError,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::state::{AppError, AppState, Status};

/// Background task that samples the clock into the session while it runs
///
/// Idle and stopped sessions are never ticked; the task sleeps on status
/// changes until the next start or resume.
pub async fn tick_driver_task(state: Arc<AppState>) {
    info!("Starting tick driver task ({}ms cadence)", state.tick_interval.as_millis());

    let mut status_rx = state.status_change_tx.subscribe();

    loop {
        let running = matches!(state.status(), Ok(Status::Running));

        if !running {
            match status_rx.recv().await {
                Ok(Status::Running) => {}
                Ok(status) => {
                    debug!("Tick driver idle, session is {}", status);
                    continue;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Tick driver skipped {} status changes", skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    info!("Status channel closed, stopping tick driver");
                    return;
                }
            }
        }

        debug!("Session running, ticking every {}ms", state.tick_interval.as_millis());
        let mut ticker = interval(state.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match state.tick() {
                        Ok(snapshot) => {
                            debug!("Tick: elapsed={}ms, laps={}", snapshot.elapsed_ms, snapshot.laps.len());
                        }
                        Err(AppError::Transition(e)) => {
                            debug!("Tick rejected, pausing driver: {}", e);
                            break;
                        }
                        Err(e) => {
                            error!("Failed to tick session: {}", e);
                            break;
                        }
                    }
                }

                result = status_rx.recv() => {
                    match result {
                        Ok(Status::Running) => {}
                        Ok(status) => {
                            debug!("Session is {}, pausing tick driver", status);
                            break;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Tick driver skipped {} status changes", skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("Status channel closed, stopping tick driver");
                            return;
                        }
                    }
                }
            }
        }
    }
}
