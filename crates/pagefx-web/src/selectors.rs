#![forbid(unsafe_code)]

//! The DOM contract: which selectors locate each page element, plus the
//! small pieces of page policy the adapter applies on its own.
//!
//! Compiled on every target so the contract and boot options can be
//! checked in native tests.

use core::time::Duration;

use pagefx_core::PageConfig;
use pagefx_core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Media query for the reduced-motion preference.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Descendants that take part in the dropdown's Tab cycle.
pub const FOCUSABLE_SELECTOR: &str = "a[href], button:not([disabled]), input:not([disabled]), \
     select:not([disabled]), textarea:not([disabled]), [tabindex]:not([tabindex=\"-1\"])";

/// Delay before an anchor target receives focus after a smooth scroll.
pub const ANCHOR_FOCUS_DELAY: Duration = Duration::from_millis(400);

/// CSS selectors for every element the page behavior uses.
///
/// Every element is optional: a selector that matches nothing disables only
/// the component that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub header: String,
    pub hero: String,
    pub video: String,
    pub progress: String,
    pub reveal: String,
    /// Class that marks a reveal target as a card (adds `pop-in`).
    pub card_class: String,
    pub ticker_track: String,
    pub dropdown_toggle: String,
    pub dropdown_panel: String,
    /// Accordion items, matched inside the panel.
    pub dropdown_item: String,
    pub variant_button: String,
    pub variant_callout: String,
    /// Variant blocks, matched inside each callout.
    pub variant_block: String,
    pub live_region: String,
    pub slogan: String,
    pub year: String,
    pub section: String,
    pub anchor: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            header: "#site-header".into(),
            hero: "#hero".into(),
            video: ".hero-video".into(),
            progress: "#scroll-progress".into(),
            reveal: ".reveal".into(),
            card_class: "card".into(),
            ticker_track: ".ticker-track".into(),
            dropdown_toggle: ".dropdown-toggle".into(),
            dropdown_panel: ".dropdown-menu".into(),
            dropdown_item: ".dropdown-item".into(),
            variant_button: ".impl-variant-btn".into(),
            variant_callout: ".impl-callout".into(),
            variant_block: ".variant".into(),
            live_region: "#sr-status".into(),
            slogan: ".slogan-rotator .slogan".into(),
            year: "#year".into(),
            section: "main section".into(),
            anchor: "a[href^=\"#\"]".into(),
        }
    }
}

/// Options accepted by the wasm entry point, as one JSON document.
///
/// ```json
/// { "config": { "ticker": { "px_per_sec": 60.0 } },
///   "selectors": { "hero": "#top" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootOptions {
    pub config: PageConfig,
    pub selectors: PageSelectors,
}

impl BootOptions {
    /// Parse and validate. An absent or blank document yields the defaults.
    pub fn from_json(raw: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Ok(Self::default());
        };
        let options: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        options.config.validate()?;
        Ok(options)
    }
}

/// The in-page target of an anchor `href`, if it has one.
///
/// A bare `#` links to the top of the page and is left to the browser.
#[must_use]
pub fn anchor_target(href: &str) -> Option<&str> {
    (href.len() > 1 && href.starts_with('#')).then_some(href)
}

/// Scroll behavior for anchor navigation.
#[must_use]
pub const fn scroll_behavior(reduced_motion: bool) -> &'static str {
    if reduced_motion { "auto" } else { "smooth" }
}

/// How long to wait before focusing an anchor target.
#[must_use]
pub const fn anchor_focus_delay(reduced_motion: bool) -> Duration {
    if reduced_motion {
        Duration::ZERO
    } else {
        ANCHOR_FOCUS_DELAY
    }
}
