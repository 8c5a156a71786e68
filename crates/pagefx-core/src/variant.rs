#![forbid(unsafe_code)]

//! A/B implementation-variant switch.
//!
//! Buttons carry a variant; pressing one persists it, marks the matching
//! button pressed, and shows only the matching blocks inside every callout.
//! The switch needs at least one button and one callout, otherwise it stays
//! inert.

use tracing::debug;

use crate::config::PreferenceConfig;
use crate::geometry::NodeId;
use crate::host::{Dom, PreferenceStore};
use crate::preference::Variant;

/// Class marking a callout as driven by the switch.
pub const ACTIVE_CLASS: &str = "active";

/// Elements of the variant switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantParts {
    /// Buttons with the variant they select.
    pub buttons: Vec<(NodeId, Variant)>,
    pub callouts: Vec<NodeId>,
    /// Variant-specific blocks inside the callouts.
    pub blocks: Vec<(NodeId, Variant)>,
    /// Polite live region for the status announcement.
    pub live_region: Option<NodeId>,
}

/// Variant switch state.
#[derive(Debug, Clone)]
pub struct VariantToggle {
    parts: VariantParts,
    key: String,
    current: Variant,
}

impl VariantToggle {
    /// Create the switch. Returns `None` when buttons or callouts are absent.
    #[must_use]
    pub fn new(parts: VariantParts, config: &PreferenceConfig) -> Option<Self> {
        if parts.buttons.is_empty() || parts.callouts.is_empty() {
            debug!("variant switch disabled: no buttons or callouts");
            return None;
        }
        Some(Self {
            parts,
            key: config.key.clone(),
            current: Variant::default(),
        })
    }

    #[must_use]
    pub const fn current(&self) -> Variant {
        self.current
    }

    /// Apply the stored preference without announcing it.
    pub fn init<D: Dom, S: PreferenceStore + ?Sized>(&mut self, dom: &mut D, store: &S) -> Variant {
        self.current = Variant::load(store, &self.key);
        self.apply(dom);
        self.current
    }

    /// Switch to `variant`, persist it, and announce the change.
    pub fn select<D: Dom, S: PreferenceStore + ?Sized>(
        &mut self,
        dom: &mut D,
        store: &mut S,
        variant: Variant,
    ) {
        self.current = variant;
        variant.save(store, &self.key);
        self.apply(dom);
        if let Some(region) = self.parts.live_region {
            dom.set_text(region, &format!("Showing implementation variant {variant}"));
        }
        debug!(%variant, "implementation variant selected");
    }

    /// A click on `button`. Returns the selected variant, if it was a switch
    /// button.
    pub fn on_button_click<D: Dom, S: PreferenceStore + ?Sized>(
        &mut self,
        dom: &mut D,
        store: &mut S,
        button: NodeId,
    ) -> Option<Variant> {
        let variant = self
            .parts
            .buttons
            .iter()
            .find(|(node, _)| *node == button)
            .map(|(_, v)| *v)?;
        self.select(dom, store, variant);
        Some(variant)
    }

    fn apply<D: Dom>(&self, dom: &mut D) {
        for &(button, variant) in &self.parts.buttons {
            let pressed = if variant == self.current { "true" } else { "false" };
            dom.set_attribute(button, "aria-pressed", pressed);
        }
        for &callout in &self.parts.callouts {
            dom.add_class(callout, ACTIVE_CLASS);
        }
        for &(block, variant) in &self.parts.blocks {
            let display = if variant == self.current { "block" } else { "none" };
            dom.set_style(block, "display", display);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessPage;
    use crate::preference::MemoryStore;

    const BTN_A: NodeId = NodeId::new(1);
    const BTN_B: NodeId = NodeId::new(2);
    const CALLOUT: NodeId = NodeId::new(3);
    const BLOCK_A: NodeId = NodeId::new(4);
    const BLOCK_B: NodeId = NodeId::new(5);
    const LIVE: NodeId = NodeId::new(6);

    fn parts() -> VariantParts {
        VariantParts {
            buttons: vec![(BTN_A, Variant::A), (BTN_B, Variant::B)],
            callouts: vec![CALLOUT],
            blocks: vec![(BLOCK_A, Variant::A), (BLOCK_B, Variant::B)],
            live_region: Some(LIVE),
        }
    }

    #[test]
    fn needs_buttons_and_callouts() {
        let config = PreferenceConfig::default();
        let mut no_callouts = parts();
        no_callouts.callouts.clear();
        assert!(VariantToggle::new(no_callouts, &config).is_none());
        assert!(VariantToggle::new(VariantParts::default(), &config).is_none());
    }

    #[test]
    fn init_applies_default_without_announcing() {
        let mut page = HeadlessPage::default();
        let store = MemoryStore::new();
        let mut toggle = VariantToggle::new(parts(), &PreferenceConfig::default()).unwrap();
        assert_eq!(toggle.init(&mut page, &store), Variant::A);
        assert_eq!(page.attribute(BTN_A, "aria-pressed"), Some("true"));
        assert_eq!(page.attribute(BTN_B, "aria-pressed"), Some("false"));
        assert_eq!(page.style(BLOCK_A, "display"), Some("block"));
        assert_eq!(page.style(BLOCK_B, "display"), Some("none"));
        assert!(page.has_class(CALLOUT, ACTIVE_CLASS));
        assert_eq!(page.text(LIVE), None);
    }

    #[test]
    fn click_persists_and_announces() {
        let mut page = HeadlessPage::default();
        let mut store = MemoryStore::new();
        let mut toggle = VariantToggle::new(parts(), &PreferenceConfig::default()).unwrap();
        toggle.init(&mut page, &store);

        assert_eq!(
            toggle.on_button_click(&mut page, &mut store, BTN_B),
            Some(Variant::B)
        );
        assert_eq!(store.get("implVariant"), Some("B"));
        assert_eq!(page.style(BLOCK_A, "display"), Some("none"));
        assert_eq!(page.style(BLOCK_B, "display"), Some("block"));
        assert_eq!(page.text(LIVE), Some("Showing implementation variant B"));

        assert_eq!(toggle.on_button_click(&mut page, &mut store, CALLOUT), None);
    }

    #[test]
    fn stored_preference_is_restored() {
        let mut page = HeadlessPage::default();
        let mut store = MemoryStore::new();
        Variant::B.save(&mut store, "implVariant");
        let mut toggle = VariantToggle::new(parts(), &PreferenceConfig::default()).unwrap();
        assert_eq!(toggle.init(&mut page, &store), Variant::B);
        assert_eq!(page.attribute(BTN_B, "aria-pressed"), Some("true"));
    }

    #[test]
    fn storage_failure_still_switches() {
        let mut page = HeadlessPage::default();
        let mut store = MemoryStore::unavailable();
        let mut toggle = VariantToggle::new(parts(), &PreferenceConfig::default()).unwrap();
        toggle.init(&mut page, &store);
        toggle.select(&mut page, &mut store, Variant::B);
        assert_eq!(toggle.current(), Variant::B);
        assert_eq!(page.style(BLOCK_B, "display"), Some("block"));
    }
}
