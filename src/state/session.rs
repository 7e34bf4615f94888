//! Stopwatch session state machine
//!
//! `TimerSession` is a pure value: every operation takes the current time in
//! milliseconds from the caller, so it never reads a clock or schedules work.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Never started, or reset
    #[default]
    Idle,
    /// Accumulating time
    Running,
    /// Paused after at least one start
    Stopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Idle => "idle",
            Status::Running => "running",
            Status::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Events accepted by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Start,
    Tick,
    Lap,
    Stop,
    Resume,
    Reset,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Start => "start",
            Event::Tick => "tick",
            Event::Lap => "lap",
            Event::Stop => "stop",
            Event::Resume => "resume",
            Event::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Rejected event; the session is left exactly as it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {event} while {status}")]
    InvalidStateTransition { event: Event, status: Status },
}

/// Fastest and slowest completed lap durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapExtremes {
    pub fastest_ms: u64,
    pub slowest_ms: u64,
}

/// One row of the lap table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapEntry {
    pub number: usize,
    pub duration_ms: u64,
    /// The in-progress lap, never flagged fastest or slowest
    pub current: bool,
    pub fastest: bool,
    pub slowest: bool,
}

/// Everything a display needs to redraw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: Status,
    pub elapsed_ms: u64,
    pub laps: Vec<LapEntry>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        TimerSession::new().snapshot()
    }
}

/// Start/stop/lap stopwatch driven by caller-supplied timestamps
#[derive(Debug, Clone, Default)]
pub struct TimerSession {
    status: Status,
    segment_start: u64,
    anchor_now: u64,
    /// Completed laps, most recent first
    completed: VecDeque<u64>,
    current: u64,
}

impl TimerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Begin timing from Idle with a single empty lap
    pub fn start(&mut self, now: u64) -> Result<(), TransitionError> {
        self.require(Event::Start, Status::Idle)?;
        self.segment_start = now;
        self.anchor_now = now;
        self.current = 0;
        self.completed.clear();
        self.status = Status::Running;
        Ok(())
    }

    /// Advance the sampling anchor. Lap boundaries are untouched.
    pub fn tick(&mut self, now: u64) -> Result<(), TransitionError> {
        self.require(Event::Tick, Status::Running)?;
        self.anchor_now = self.clamp(now);
        Ok(())
    }

    /// Close the current lap and open a new one at `now`.
    ///
    /// Returns the finalized lap duration.
    pub fn lap(&mut self, now: u64) -> Result<u64, TransitionError> {
        self.require(Event::Lap, Status::Running)?;
        let now = self.clamp(now);
        let finished = self.current.saturating_add(now - self.segment_start);
        self.completed.push_front(finished);
        self.current = 0;
        self.segment_start = now;
        self.anchor_now = now;
        Ok(finished)
    }

    /// Fold the open segment into the current lap and pause.
    pub fn stop(&mut self, now: u64) -> Result<(), TransitionError> {
        self.require(Event::Stop, Status::Running)?;
        let now = self.clamp(now);
        self.current = self.current.saturating_add(now - self.segment_start);
        self.segment_start = 0;
        self.anchor_now = 0;
        self.status = Status::Stopped;
        Ok(())
    }

    /// Reopen a segment; time keeps accumulating into the same lap.
    pub fn resume(&mut self, now: u64) -> Result<(), TransitionError> {
        self.require(Event::Resume, Status::Stopped)?;
        self.segment_start = now;
        self.anchor_now = now;
        self.status = Status::Running;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.require(Event::Reset, Status::Stopped)?;
        *self = Self::default();
        Ok(())
    }

    /// Total running time up to the last sampled tick
    pub fn elapsed_total(&self) -> u64 {
        self.completed
            .iter()
            .fold(self.current_lap(), |total, &lap| total.saturating_add(lap))
    }

    /// In-progress lap including the live segment
    pub fn current_lap(&self) -> u64 {
        self.current.saturating_add(self.live_segment())
    }

    /// Completed laps, most recent first
    pub fn completed_laps(&self) -> impl Iterator<Item = u64> + '_ {
        self.completed.iter().copied()
    }

    /// Min and max over completed laps; needs at least two of them.
    ///
    /// Laps are flagged by value, so equal laps share a flag. When every
    /// completed lap is equal they are all both fastest and slowest.
    pub fn fastest_and_slowest(&self) -> Option<LapExtremes> {
        if self.completed.len() < 2 {
            return None;
        }
        let fastest_ms = *self.completed.iter().min()?;
        let slowest_ms = *self.completed.iter().max()?;
        Some(LapExtremes { fastest_ms, slowest_ms })
    }

    /// Lap table, most recent first, current lap included
    pub fn laps(&self) -> Vec<LapEntry> {
        if self.status == Status::Idle {
            return Vec::new();
        }

        let total = self.completed.len() + 1;
        let extremes = self.fastest_and_slowest();

        let current = LapEntry {
            number: total,
            duration_ms: self.current_lap(),
            current: true,
            fastest: false,
            slowest: false,
        };

        let finished = self.completed.iter().enumerate().map(|(i, &duration_ms)| LapEntry {
            number: total - (i + 1),
            duration_ms,
            current: false,
            fastest: extremes.is_some_and(|e| duration_ms == e.fastest_ms),
            slowest: extremes.is_some_and(|e| duration_ms == e.slowest_ms),
        });

        std::iter::once(current).chain(finished).collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            elapsed_ms: self.elapsed_total(),
            laps: self.laps(),
        }
    }

    fn live_segment(&self) -> u64 {
        match self.status {
            Status::Running => self.anchor_now - self.segment_start,
            _ => 0,
        }
    }

    // Timestamps earlier than the last observed one are treated as "no time passed".
    fn clamp(&self, now: u64) -> u64 {
        now.max(self.anchor_now).max(self.segment_start)
    }

    fn require(&self, event: Event, required: Status) -> Result<(), TransitionError> {
        if self.status == required {
            Ok(())
        } else {
            Err(TransitionError::InvalidStateTransition {
                event,
                status: self.status,
            })
        }
    }
}
