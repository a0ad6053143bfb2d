//! Poll timer - periodic trigger driven by the host's update loop.
//!
//! Stands in for a native time-update event on backends that lack one.
//! The timer never runs on its own thread: the owner calls `tick(now)` from
//! its update loop and acts when it returns `true`.
//!
//! ```ignore
//! // while playing:
//! if !timer.is_running() {
//!     timer.start(now);
//! }
//! if timer.tick(now) {
//!     emit(TimeUpdate(player.current_time()));
//! }
//! // on pause / destroy:
//! timer.cancel();
//! ```

use std::time::{Duration, Instant};

/// Default embedded-backend poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct PollTimer {
    interval: Duration,
    /// Next trigger time; `None` while stopped
    next_due: Option<Instant>,
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer; first trigger one interval after `now`.
    /// Restarts the period if already running.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
        log::trace!("PollTimer: armed, every {}ms", self.interval.as_millis());
    }

    pub fn cancel(&mut self) {
        if self.next_due.take().is_some() {
            log::trace!("PollTimer: cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// `true` once per elapsed interval. Missed periods collapse into a
    /// single trigger.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };

        if now >= due {
            self.next_due = Some(now + self.interval);
            true
        } else {
            false
        }
    }
}
