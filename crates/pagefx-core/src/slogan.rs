#![forbid(unsafe_code)]

//! Fixed-interval slogan rotation.
//!
//! Exactly one slogan carries the `active` class at any time. The CSS owns
//! the transition; this only moves the class every display + transition
//! period. Under reduced motion the first slogan stays put.

use core::time::Duration;

use tracing::trace;

use crate::config::SloganConfig;
use crate::geometry::NodeId;
use crate::host::Dom;

/// Class on the visible slogan.
pub const ACTIVE_CLASS: &str = "active";

/// Slogan rotator.
#[derive(Debug, Clone)]
pub struct SloganRotator {
    slogans: Vec<NodeId>,
    index: usize,
    interval: Duration,
    next_at: Option<Duration>,
    animate: bool,
}

impl SloganRotator {
    /// Returns `None` when the page has no slogans or the interval is zero.
    #[must_use]
    pub fn new(slogans: Vec<NodeId>, config: &SloganConfig, reduced_motion: bool) -> Option<Self> {
        if slogans.is_empty() || config.interval().is_zero() {
            return None;
        }
        Some(Self {
            slogans,
            index: 0,
            interval: config.interval(),
            next_at: None,
            animate: !reduced_motion,
        })
    }

    /// Show the first slogan and schedule the first rotation.
    pub fn init<D: Dom>(&mut self, dom: &mut D, now: Duration) {
        for &slogan in &self.slogans {
            dom.remove_class(slogan, ACTIVE_CLASS);
        }
        self.index = 0;
        dom.add_class(self.slogans[0], ACTIVE_CLASS);
        // A single slogan has nowhere to rotate to.
        self.next_at =
            (self.animate && self.slogans.len() > 1).then(|| now.saturating_add(self.interval));
    }

    /// Index of the active slogan.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// When the next rotation is due.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Duration> {
        self.next_at
    }

    /// Advance every interval that has elapsed by `now`.
    ///
    /// Returns `true` if the active slogan changed.
    pub fn tick<D: Dom>(&mut self, dom: &mut D, now: Duration) -> bool {
        let Some(mut due) = self.next_at else {
            return false;
        };
        if now < due {
            return false;
        }
        let before = self.index;
        // Every interval boundary in [due, now] is one step.
        let steps = (now - due).as_nanos() / self.interval.as_nanos() + 1;
        let len = self.slogans.len();
        let advance = usize::try_from(steps % len as u128).unwrap_or(0);
        self.index = (self.index + advance) % len;
        due = due.saturating_add(duration_from_nanos(steps * self.interval.as_nanos()));
        self.next_at = Some(due);
        dom.remove_class(self.slogans[before], ACTIVE_CLASS);
        dom.add_class(self.slogans[self.index], ACTIVE_CLASS);
        trace!(index = self.index, "slogan rotated");
        self.index != before
    }

    /// Stop rotating.
    pub fn stop(&mut self) {
        self.next_at = None;
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX);
    let sub = u32::try_from(nanos % 1_000_000_000).unwrap_or(0);
    Duration::new(secs, sub)
}
