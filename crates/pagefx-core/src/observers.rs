#![forbid(unsafe_code)]

//! Scroll-driven observers: header solidify, progress bar, reveal-on-scroll.
//!
//! The header and progress derivations are pure functions of one
//! [`Viewport`] and are re-applied on every scroll tick, in arrival order.
//! Reveal is one-shot per element: once an element is revealed it is never
//! hidden again and the host stops observing it.

use tracing::{debug, trace};

use crate::config::{HeaderConfig, RevealConfig};
use crate::geometry::{Layout, NodeId, Viewport};
use crate::host::Dom;

/// Class applied to the header once the hero is scrolled past.
pub const SOLID_CLASS: &str = "solid";
/// Class applied to a revealed element.
pub const VISIBLE_CLASS: &str = "visible";
/// Extra class applied to revealed card elements.
pub const POP_IN_CLASS: &str = "pop-in";

// ---------------------------------------------------------------------------
// Pure derivations
// ---------------------------------------------------------------------------

/// Whether the header is solid at `scroll_y` (exclusive threshold).
#[inline]
#[must_use]
pub fn header_is_solid(scroll_y: f64, hero_height: f64, offset_px: f64) -> bool {
    scroll_y > hero_height - offset_px
}

/// Scroll progress in percent. `0` when the document cannot scroll.
#[inline]
#[must_use]
pub fn progress_percent(viewport: &Viewport) -> f64 {
    let total = viewport.document_scrollable();
    if total > 0.0 {
        viewport.scroll_y / total * 100.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Header + progress
// ---------------------------------------------------------------------------

/// Header element plus the hero whose height sets the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderObserver {
    header: NodeId,
    hero: NodeId,
    offset_px: f64,
}

impl HeaderObserver {
    #[must_use]
    pub fn new(header: NodeId, hero: NodeId, config: &HeaderConfig) -> Self {
        Self {
            header,
            hero,
            offset_px: config.solid_offset_px,
        }
    }

    /// Apply the solid flag for this tick. Returns the flag.
    pub fn apply<H: Layout + Dom>(&self, host: &mut H, viewport: &Viewport) -> bool {
        let hero_height = host.client_height(self.hero);
        let solid = header_is_solid(viewport.scroll_y, hero_height, self.offset_px);
        host.set_class(self.header, SOLID_CLASS, solid);
        solid
    }
}

/// Progress indicator element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressObserver {
    bar: NodeId,
}

impl ProgressObserver {
    #[must_use]
    pub const fn new(bar: NodeId) -> Self {
        Self { bar }
    }

    /// Write the width for this tick. Returns the percentage.
    pub fn apply<D: Dom>(&self, dom: &mut D, viewport: &Viewport) -> f64 {
        let pct = progress_percent(viewport);
        dom.set_style(self.bar, "width", &format!("{pct}%"));
        pct
    }
}

// ---------------------------------------------------------------------------
// Reveal
// ---------------------------------------------------------------------------

/// An element waiting to be revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTarget {
    pub node: NodeId,
    /// Card variants also get the pop-in class.
    pub card: bool,
}

impl RevealTarget {
    #[must_use]
    pub const fn new(node: NodeId, card: bool) -> Self {
        Self { node, card }
    }
}

/// One intersection change reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
    /// Visible share of the element, `[0, 1]`.
    pub ratio: f64,
}

/// Options the host passes to its intersection observer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// CSS margin string, e.g. `0px 0px -10% 0px`.
    pub root_margin: String,
    pub threshold: f64,
}

/// One-shot reveal tracker.
#[derive(Debug, Clone)]
pub struct RevealObserver {
    pending: Vec<RevealTarget>,
    config: RevealConfig,
}

impl RevealObserver {
    #[must_use]
    pub fn new(targets: Vec<RevealTarget>, config: &RevealConfig) -> Self {
        Self {
            pending: targets,
            config: *config,
        }
    }

    /// Intersection observer options derived from the config.
    #[must_use]
    pub fn options(&self) -> ObserverOptions {
        ObserverOptions {
            root_margin: format!("0px 0px -{}% 0px", self.config.bottom_margin_pct),
            threshold: self.config.threshold,
        }
    }

    /// Elements still waiting to be revealed.
    #[must_use]
    pub fn pending(&self) -> Vec<NodeId> {
        self.pending.iter().map(|t| t.node).collect()
    }

    /// Whether every target has been revealed.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Reveal everything immediately (no observer, or reduced motion).
    pub fn reveal_all<D: Dom>(&mut self, dom: &mut D) {
        debug!(count = self.pending.len(), "revealing all targets without animation");
        for target in self.pending.drain(..) {
            mark_revealed(dom, target);
        }
    }

    /// Handle a batch of intersection changes.
    ///
    /// Returns the elements the host must stop observing.
    pub fn on_intersections<D: Dom>(
        &mut self,
        dom: &mut D,
        entries: &[IntersectionEntry],
    ) -> Vec<NodeId> {
        let mut done = Vec::new();
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(pos) = self.pending.iter().position(|t| t.node == entry.target) else {
                continue;
            };
            let target = self.pending.swap_remove(pos);
            trace!(node = target.node.get(), ratio = entry.ratio, "revealed");
            mark_revealed(dom, target);
            done.push(target.node);
        }
        done
    }
}

fn mark_revealed<D: Dom>(dom: &mut D, target: RevealTarget) {
    dom.add_class(target.node, VISIBLE_CLASS);
    if target.card {
        dom.add_class(target.node, POP_IN_CLASS);
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Derived state for one scroll tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFrame {
    /// `None` when the page has no header or hero.
    pub header_solid: Option<bool>,
    /// `None` when the page has no progress indicator.
    pub progress_pct: Option<f64>,
}

/// The scroll observers of one page.
#[derive(Debug, Clone)]
pub struct ScrollObservers {
    header: Option<HeaderObserver>,
    progress: Option<ProgressObserver>,
    reveal: RevealObserver,
}

impl ScrollObservers {
    #[must_use]
    pub fn new(
        header: Option<HeaderObserver>,
        progress: Option<ProgressObserver>,
        reveal: RevealObserver,
    ) -> Self {
        Self {
            header,
            progress,
            reveal,
        }
    }

    /// Reveal tracker.
    #[must_use]
    pub fn reveal(&self) -> &RevealObserver {
        &self.reveal
    }

    /// Mutable reveal tracker.
    pub fn reveal_mut(&mut self) -> &mut RevealObserver {
        &mut self.reveal
    }

    /// Recompute header and progress for one tick.
    pub fn on_scroll<H: Layout + Dom>(
        &self,
        host: &mut H,
        viewport: &Viewport,
    ) -> ScrollFrame {
        let header_solid = self.header.map(|h| h.apply(host, viewport));
        let progress_pct = self.progress.map(|p| p.apply(host, viewport));
        trace!(
            scroll_y = viewport.scroll_y,
            ?header_solid,
            ?progress_pct,
            "scroll tick"
        );
        ScrollFrame {
            header_solid,
            progress_pct,
        }
    }
}
