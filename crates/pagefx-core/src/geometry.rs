#![forbid(unsafe_code)]

//! Geometry primitives and the read-only [`Layout`].

/// Opaque handle to a page element, assigned by the host.
///
/// Handles are stable for the page lifetime. The core never inspects the
/// value; it only passes handles back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw host handle.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw host handle.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Snapshot of the document viewport for one scroll or resize tick.
///
/// All values are CSS pixels. Ephemeral: recomputed on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Vertical scroll offset (`window.scrollY`). May be negative on
    /// platforms with elastic overscroll.
    pub scroll_y: f64,
    /// Viewport width (`window.innerWidth`).
    pub width: f64,
    /// Viewport height (`window.innerHeight`).
    pub height: f64,
    /// Full document height (`documentElement.scrollHeight`).
    pub scroll_height: f64,
    /// Visible document height (`documentElement.clientHeight`).
    pub client_height: f64,
}

impl Viewport {
    /// Distance the document can scroll vertically.
    #[inline]
    #[must_use]
    pub fn document_scrollable(&self) -> f64 {
        self.scroll_height - self.client_height
    }

    /// Same viewport at a different scroll offset.
    #[inline]
    #[must_use]
    pub fn at(self, scroll_y: f64) -> Self {
        Self { scroll_y, ..self }
    }
}

/// Read-only geometry queries answered by the host.
///
/// Implementations hold no state of their own; every call reflects the
/// current layout. A hidden or detached element reports `0.0`.
pub trait Layout {
    /// Current viewport and scroll state.
    fn viewport(&self) -> Viewport;

    /// Rendered height of an element (`clientHeight`).
    fn client_height(&self, node: NodeId) -> f64;

    /// Full content width of an element including overflow (`scrollWidth`).
    fn scroll_width(&self, node: NodeId) -> f64;

    /// Width of the element's parent (`parentElement.clientWidth`).
    fn parent_width(&self, node: NodeId) -> f64;
}
