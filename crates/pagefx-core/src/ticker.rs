#![forbid(unsafe_code)]

//! Seamless marquee ("ticker") loop engine.
//!
//! A track loops seamlessly when its content is two identical halves and the
//! animation translates it by exactly one half. The engine builds that shape
//! from live geometry and rebuilds it when the layout changes.
//!
//! # Fill Algorithm
//!
//! 1. Cancel the track's running loop.
//! 2. On the first fill only, detect the canonical unit: if the children are
//!    two identical halves (left over from a previous fill, or authored that
//!    way) keep the first half; otherwise keep everything. Cached per track.
//! 3. Restore the canonical unit, then append a copy of the full child set
//!    until `scrollWidth >= 2 * parentWidth`. At least one pass always runs.
//! 4. `distance = floor(scrollWidth / 2)`,
//!    `duration = max(min_duration, round(distance / px_per_sec * 1000) ms)`.
//! 5. Start an infinite linear loop from `0` to `-distance`; if that fails,
//!    publish the timing as CSS custom properties instead.
//!
//! # Invariants
//!
//! - Fill never exceeds `max_fill_passes` duplication passes.
//! - A pass that adds no measurable width ends the fill (hidden or detached
//!   layout reports zero widths), so degenerate geometry adds one copy at most.
//! - Refilling with unchanged geometry reproduces the same children.
//! - At most one loop animation per track is alive.
//!
//! # Failure Modes
//!
//! - Reduced motion: tracks are left untouched (no duplication, no loop).
//! - No children: nothing to loop; the track stays static.
//! - Zero distance: no animation is started.

use core::time::Duration;

use tracing::{debug, trace, warn};

use crate::config::TickerConfig;
use crate::debounce::TrailingDebounce;
use crate::geometry::{Layout, NodeId};
use crate::host::{Dom, LoopHandle, LoopSpec, Tracks};

/// Custom property carrying the loop duration for the CSS fallback.
pub const DURATION_PROPERTY: &str = "--ticker-duration";
/// Custom property carrying the loop distance for the CSS fallback.
pub const DISTANCE_PROPERTY: &str = "--ticker-distance";

/// How a filled track ended up moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// A scripted loop animation is running.
    Animated,
    /// Scripted animation failed; CSS custom properties carry the timing.
    CssFallback,
    /// Nothing to animate (no content or zero distance).
    Static,
}

/// Result of filling one track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillReport {
    pub track: NodeId,
    /// Duplication passes performed.
    pub passes: u32,
    /// Track `scrollWidth` after the fill.
    pub scroll_width: f64,
    /// Parent width the fill targeted.
    pub parent_width: f64,
    /// Loop distance in pixels.
    pub distance_px: u32,
    /// Loop cycle duration.
    pub duration: Duration,
    pub outcome: LoopOutcome,
}

/// The canonical unit of a child list: its first half when the list is two
/// identical halves, otherwise the whole list.
#[must_use]
pub fn canonical_unit(children: &[String]) -> &[String] {
    let len = children.len();
    if len >= 2 && len % 2 == 0 {
        let (front, back) = children.split_at(len / 2);
        if front == back {
            return front;
        }
    }
    children
}

/// Loop duration for a distance at the configured reference speed.
#[must_use]
pub fn loop_duration(distance_px: u32, config: &TickerConfig) -> Duration {
    let ms = (f64::from(distance_px) / config.px_per_sec * 1000.0).round();
    let ms = if ms.is_finite() && ms > 0.0 {
        ms as u64
    } else {
        0
    };
    Duration::from_millis(ms).max(config.min_duration())
}

#[derive(Debug, Clone)]
struct TickerTrack {
    node: NodeId,
    canonical: Option<Vec<String>>,
    distance_px: u32,
    duration: Duration,
    animation: Option<LoopHandle>,
}

impl TickerTrack {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            canonical: None,
            distance_px: 0,
            duration: Duration::ZERO,
            animation: None,
        }
    }

    fn release<T: Tracks>(&mut self, tracks: &mut T) {
        if let Some(handle) = self.animation.take() {
            tracks.cancel_loop(handle);
        }
    }

    fn fill<H: Layout + Dom + Tracks>(
        &mut self,
        host: &mut H,
        config: &TickerConfig,
    ) -> FillReport {
        let node = self.node;
        self.release(host);

        let canonical = self
            .canonical
            .get_or_insert_with(|| canonical_unit(&host.child_markup(node)).to_vec())
            .clone();
        host.replace_children(node, &canonical);

        let parent_width = host.parent_width(node);
        let target = 2.0 * parent_width;
        let mut width = host.scroll_width(node);
        let mut passes = 0u32;

        if !canonical.is_empty() {
            while passes < config.max_fill_passes {
                let current = host.child_markup(node);
                host.append_children(node, &current);
                passes += 1;
                let next = host.scroll_width(node);
                let grew = next > width;
                width = next;
                if width >= target || !grew {
                    break;
                }
            }
        }

        let half = (width / 2.0).floor();
        self.distance_px = if half.is_finite() && half > 0.0 {
            half.min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        self.duration = loop_duration(self.distance_px, config);

        let outcome = if self.distance_px == 0 {
            LoopOutcome::Static
        } else {
            let spec = LoopSpec {
                distance_px: self.distance_px,
                duration: self.duration,
            };
            match host.start_loop(node, spec) {
                Ok(handle) => {
                    self.animation = Some(handle);
                    LoopOutcome::Animated
                }
                Err(err) => {
                    warn!(error = %err, track = node.get(), "ticker loop fell back to CSS");
                    host.set_style(
                        node,
                        DURATION_PROPERTY,
                        &format!("{}ms", self.duration.as_millis()),
                    );
                    host.set_style(
                        node,
                        DISTANCE_PROPERTY,
                        &format!("{}px", self.distance_px),
                    );
                    LoopOutcome::CssFallback
                }
            }
        };

        trace!(
            track = node.get(),
            passes,
            width,
            parent_width,
            distance = self.distance_px,
            "ticker track filled"
        );

        FillReport {
            track: node,
            passes,
            scroll_width: width,
            parent_width,
            distance_px: self.distance_px,
            duration: self.duration,
            outcome,
        }
    }
}

/// Owns every marquee track on the page.
#[derive(Debug, Clone)]
pub struct TickerEngine {
    tracks: Vec<TickerTrack>,
    config: TickerConfig,
    reduced_motion: bool,
    resize: TrailingDebounce,
}

impl TickerEngine {
    /// Create an engine for the given tracks.
    #[must_use]
    pub fn new(
        tracks: impl IntoIterator<Item = NodeId>,
        config: &TickerConfig,
        reduced_motion: bool,
    ) -> Self {
        Self {
            tracks: tracks.into_iter().map(TickerTrack::new).collect(),
            config: *config,
            reduced_motion,
            resize: TrailingDebounce::new(config.resize_debounce()),
        }
    }

    /// Whether the engine does anything at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.reduced_motion && !self.tracks.is_empty()
    }

    /// Current `(distance_px, duration)` of a track.
    #[must_use]
    pub fn loop_params(&self, track: NodeId) -> Option<(u32, Duration)> {
        self.tracks
            .iter()
            .find(|t| t.node == track)
            .map(|t| (t.distance_px, t.duration))
    }

    /// Fill every track and (re)start its loop now.
    pub fn refresh<H: Layout + Dom + Tracks>(&mut self, host: &mut H) -> Vec<FillReport> {
        if !self.is_active() {
            return Vec::new();
        }
        self.resize.cancel();
        let config = self.config;
        let reports: Vec<FillReport> = self
            .tracks
            .iter_mut()
            .map(|track| track.fill(host, &config))
            .collect();
        debug!(tracks = reports.len(), "ticker tracks refreshed");
        reports
    }

    /// Note a resize at `now`; the refill runs after the quiet period.
    pub fn request_refresh(&mut self, now: Duration) {
        if self.is_active() {
            self.resize.touch(now);
        }
    }

    /// When the pending refill becomes due.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.resize.deadline()
    }

    /// Run the pending refill if its quiet period has elapsed.
    pub fn poll<H: Layout + Dom + Tracks>(
        &mut self,
        host: &mut H,
        now: Duration,
    ) -> Option<Vec<FillReport>> {
        if self.resize.fire_if_due(now) {
            Some(self.refresh(host))
        } else {
            None
        }
    }

    /// Cancel every running loop.
    pub fn release<T: Tracks>(&mut self, tracks: &mut T) {
        self.resize.cancel();
        for track in &mut self.tracks {
            track.release(tracks);
        }
    }
}
