//! Wall-clock frame timing.

use std::time::{Duration, Instant};

/// Measures the time between frames.
///
/// Deltas are reported unclamped: level timers run on real time, and the
/// physics lifecycle applies its own clamp before stepping.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    elapsed: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Seconds since the previous call. The first call returns zero.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Like [`tick`](Self::tick), with the current time supplied.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        self.elapsed += delta;
        delta.as_secs_f32()
    }

    /// Total time measured since the first tick.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Forget the previous frame, e.g. after a pause.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
