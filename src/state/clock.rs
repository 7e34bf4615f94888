//! Monotonic millisecond clock

use tokio::time::Instant;

/// Milliseconds elapsed since the clock was created
///
/// Backed by `tokio::time::Instant` so paused test runtimes control it.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
