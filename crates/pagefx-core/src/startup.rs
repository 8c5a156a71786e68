#![forbid(unsafe_code)]

//! Startup scroll reset.
//!
//! A fresh navigation or reload starts at the top of the page so the hero
//! video plays in view. A back/forward restoration keeps the position the
//! browser restored.

/// How the current document was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationKind {
    Navigate,
    Reload,
    BackForward,
    Prerender,
    /// The platform did not report a navigation type.
    #[default]
    Unknown,
}

impl NavigationKind {
    /// Parse a `PerformanceNavigationTiming.type` value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "navigate" => Self::Navigate,
            "reload" => Self::Reload,
            "back_forward" => Self::BackForward,
            "prerender" => Self::Prerender,
            _ => Self::Unknown,
        }
    }

    /// Whether startup should force the scroll position to the top.
    #[must_use]
    pub const fn should_reset_scroll(self) -> bool {
        matches!(self, Self::Navigate | Self::Reload | Self::Prerender)
    }
}
