#![forbid(unsafe_code)]

//! Trailing-edge debounce on a host-supplied monotonic clock.
//!
//! Every [`TrailingDebounce::touch`] pushes the deadline out by the quiet
//! period; [`TrailingDebounce::fire_if_due`] reports `true` exactly once after
//! the events stop. The host schedules a timer for
//! [`TrailingDebounce::deadline`] and polls when it fires. Polling early or
//! twice is harmless.

use core::time::Duration;

/// Trailing debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingDebounce {
    quiet: Duration,
    last_touch: Option<Duration>,
}

impl TrailingDebounce {
    /// Create a debounce with the given quiet period.
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_touch: None,
        }
    }

    /// Quiet period.
    #[must_use]
    pub const fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Record an event at `now`.
    pub fn touch(&mut self, now: Duration) {
        self.last_touch = Some(now);
    }

    /// Whether an event is waiting for its quiet period to elapse.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.last_touch.is_some()
    }

    /// Instant at which the pending event becomes due.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.last_touch.map(|t| t.saturating_add(self.quiet))
    }

    /// Consume the pending event if its quiet period has elapsed.
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_touch = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending event.
    pub fn cancel(&mut self) {
        self.last_touch = None;
    }
}
