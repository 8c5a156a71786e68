#![forbid(unsafe_code)]

//! Event routing for one page.
//!
//! The [`Orchestrator`] owns every component and forwards each host event to
//! the component that cares about it. It holds no state of its own beyond
//! the components, the config, and the environment snapshot taken at
//! startup.
//!
//! # Event Map
//!
//! | Host event            | Components                                   |
//! |-----------------------|----------------------------------------------|
//! | setup                 | all (initial visual state)                   |
//! | `load`                | ticker (refill once fonts and images settle) |
//! | `scroll`              | header, progress, video replay gate          |
//! | `resize`              | ticker (debounced), dropdown responsive mode |
//! | timer                 | ticker debounce, slogan rotation             |
//! | intersection batch    | reveal                                       |
//! | video `playing`/`ended` | video                                      |
//! | document click        | autoplay retry, dropdown, variant switch     |
//! | document keydown      | autoplay retry, dropdown Escape              |
//! | trap keydown          | dropdown Tab wrap                            |
//!
//! Every handler is synchronous and runs to completion. Timers are not
//! owned here: the host asks [`Orchestrator::next_deadline`] after each
//! event and schedules one timeout for it.

use core::time::Duration;

use tracing::{debug, info};

use crate::config::PageConfig;
use crate::dropdown::{DropdownController, DropdownParts, Key, KeyInput, KeyOutcome};
use crate::geometry::NodeId;
use crate::host::{Host, PreferenceStore};
use crate::observers::{
    HeaderObserver, IntersectionEntry, ObserverOptions, ProgressObserver, RevealObserver,
    RevealTarget, ScrollFrame, ScrollObservers,
};
use crate::preference::{MemoryStore, Variant};
use crate::slogan::SloganRotator;
use crate::startup::NavigationKind;
use crate::ticker::{FillReport, TickerEngine};
use crate::variant::{VariantParts, VariantToggle};
use crate::video::VideoLifecycle;

/// Elements the page provides. Absent elements disable only their
/// component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMap {
    pub header: Option<NodeId>,
    pub hero: Option<NodeId>,
    pub video: Option<NodeId>,
    pub progress: Option<NodeId>,
    pub reveal: Vec<RevealTarget>,
    pub tickers: Vec<NodeId>,
    pub dropdown: Option<DropdownParts>,
    pub variant: VariantParts,
    pub slogans: Vec<NodeId>,
}

/// Platform capabilities sampled once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    /// `prefers-reduced-motion: reduce` matched.
    pub reduced_motion: bool,
    /// The platform offers intersection observation.
    pub intersection_observer: bool,
    pub navigation: NavigationKind,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            intersection_observer: true,
            navigation: NavigationKind::Navigate,
        }
    }
}

/// What the host must do after [`Orchestrator::setup`].
#[derive(Debug, Clone, PartialEq)]
pub struct SetupReport {
    /// Elements to hand to the intersection observer.
    pub observe: Vec<NodeId>,
    /// Observer options; `None` when everything was revealed up front.
    pub observer_options: Option<ObserverOptions>,
    pub tickers: Vec<FillReport>,
    /// Variant applied from the stored preference.
    pub variant: Option<Variant>,
    pub scroll_reset: bool,
}

/// Owns and drives every component of one page.
#[derive(Debug)]
pub struct Orchestrator<S = MemoryStore> {
    config: PageConfig,
    env: Environment,
    store: S,
    video: VideoLifecycle,
    ticker: TickerEngine,
    observers: ScrollObservers,
    dropdown: Option<DropdownController>,
    variant: Option<VariantToggle>,
    slogan: Option<SloganRotator>,
}

impl<S: PreferenceStore> Orchestrator<S> {
    /// Build every component from the page map.
    #[must_use]
    pub fn new(map: PageMap, config: PageConfig, env: Environment, store: S) -> Self {
        let header = match (map.header, map.hero) {
            (Some(header), Some(hero)) => Some(HeaderObserver::new(header, hero, &config.header)),
            _ => None,
        };
        let observers = ScrollObservers::new(
            header,
            map.progress.map(ProgressObserver::new),
            RevealObserver::new(map.reveal, &config.reveal),
        );
        let video = VideoLifecycle::new(map.video, &config.video);
        let ticker = TickerEngine::new(map.tickers, &config.ticker, env.reduced_motion);
        let dropdown = map
            .dropdown
            .map(|parts| DropdownController::new(parts, &config.dropdown));
        let variant = VariantToggle::new(map.variant, &config.preference);
        let slogan = SloganRotator::new(map.slogans, &config.slogan, env.reduced_motion);

        Self {
            config,
            env,
            store,
            video,
            ticker,
            observers,
            dropdown,
            variant,
            slogan,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.env
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn video(&self) -> &VideoLifecycle {
        &self.video
    }

    #[must_use]
    pub const fn ticker(&self) -> &TickerEngine {
        &self.ticker
    }

    #[must_use]
    pub const fn observers(&self) -> &ScrollObservers {
        &self.observers
    }

    #[must_use]
    pub const fn dropdown(&self) -> Option<&DropdownController> {
        self.dropdown.as_ref()
    }

    #[must_use]
    pub const fn variant(&self) -> Option<&VariantToggle> {
        self.variant.as_ref()
    }

    #[must_use]
    pub const fn slogan(&self) -> Option<&SloganRotator> {
        self.slogan.as_ref()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Bring the page into its initial visual state.
    pub fn setup<H: Host>(&mut self, host: &mut H, now: Duration) -> SetupReport {
        let scroll_reset = self.env.navigation.should_reset_scroll();
        if scroll_reset {
            host.scroll_to_top();
        }
        let viewport = host.viewport();
        self.observers.on_scroll(host, &viewport);

        let reveal = self.observers.reveal_mut();
        let (observe, observer_options) =
            if self.env.intersection_observer && !self.env.reduced_motion {
                (reveal.pending(), Some(reveal.options()))
            } else {
                reveal.reveal_all(host);
                (Vec::new(), None)
            };

        self.video.attempt_autoplay(host);
        let tickers = self.ticker.refresh(host);

        if let Some(dropdown) = self.dropdown.as_mut() {
            dropdown.init(host, viewport.width);
        }
        let variant = self
            .variant
            .as_mut()
            .map(|toggle| toggle.init(host, &self.store));
        if let Some(slogan) = self.slogan.as_mut() {
            slogan.init(host, now);
        }

        info!(
            observed = observe.len(),
            tickers = tickers.len(),
            reduced_motion = self.env.reduced_motion,
            "page behavior ready"
        );
        SetupReport {
            observe,
            observer_options,
            tickers,
            variant,
            scroll_reset,
        }
    }

    /// The document finished loading: geometry may have changed.
    pub fn on_load<H: Host>(&mut self, host: &mut H) -> Vec<FillReport> {
        self.ticker.refresh(host)
    }

    /// One scroll tick.
    pub fn on_scroll<H: Host>(&mut self, host: &mut H) -> ScrollFrame {
        let viewport = host.viewport();
        let frame = self.observers.on_scroll(host, &viewport);
        self.video.on_scroll(host, &viewport);
        frame
    }

    /// The viewport was resized at `now`.
    pub fn on_resize<H: Host>(&mut self, host: &mut H, now: Duration) {
        self.ticker.request_refresh(now);
        let width = host.viewport().width;
        if let Some(dropdown) = self.dropdown.as_mut() {
            dropdown.on_resize(host, width);
        }
    }

    /// A timer scheduled for [`Self::next_deadline`] fired.
    pub fn on_timer<H: Host>(&mut self, host: &mut H, now: Duration) {
        if let Some(reports) = self.ticker.poll(host, now) {
            debug!(tracks = reports.len(), "debounced ticker refill ran");
        }
        if let Some(slogan) = self.slogan.as_mut() {
            slogan.tick(host, now);
        }
    }

    /// Earliest instant at which [`Self::on_timer`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        let slogan = self.slogan.as_ref().and_then(SloganRotator::next_deadline);
        match (self.ticker.deadline(), slogan) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Release every long-lived host resource.
    pub fn teardown<H: Host>(&mut self, host: &mut H) {
        self.ticker.release(host);
        if let Some(dropdown) = self.dropdown.as_mut() {
            dropdown.close(host);
        }
        if let Some(slogan) = self.slogan.as_mut() {
            slogan.stop();
        }
        debug!("page behavior torn down");
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// A batch of intersection changes. Returns the elements to unobserve.
    pub fn on_intersections<H: Host>(
        &mut self,
        host: &mut H,
        entries: &[IntersectionEntry],
    ) -> Vec<NodeId> {
        self.observers.reveal_mut().on_intersections(host, entries)
    }

    pub fn on_video_playing<H: Host>(&mut self, host: &mut H) {
        self.video.on_playing(host);
    }

    pub fn on_video_ended<H: Host>(&mut self, host: &mut H) {
        self.video.on_ended(host);
    }

    /// The asynchronous play request was rejected. Returns `true` when the
    /// gesture retry was armed.
    pub fn on_play_rejected(&mut self) -> bool {
        self.video.on_play_rejected()
    }

    /// A click anywhere in the document.
    pub fn on_click<H: Host>(&mut self, host: &mut H, target: NodeId) {
        self.video.on_user_gesture(host);
        if let Some(dropdown) = self.dropdown.as_mut() {
            dropdown.on_document_click(host, target);
        }
        if let Some(toggle) = self.variant.as_mut() {
            toggle.on_button_click(host, &mut self.store, target);
        }
    }

    /// A key press anywhere in the document.
    pub fn on_keydown<H: Host>(&mut self, host: &mut H, input: KeyInput) -> KeyOutcome {
        self.video.on_user_gesture(host);
        if input.key == Key::Escape {
            if let Some(dropdown) = self.dropdown.as_mut() {
                dropdown.on_escape(host);
            }
        }
        KeyOutcome::IGNORED
    }

    /// A key press delivered through the dropdown's trap listener.
    pub fn on_trap_key<H: Host>(&mut self, host: &mut H, input: KeyInput) -> KeyOutcome {
        self.dropdown
            .as_mut()
            .map_or(KeyOutcome::IGNORED, |d| d.on_trap_key(host, input))
    }

    /// Click on a dropdown accordion item.
    pub fn on_item_activate<H: Host>(&mut self, host: &mut H, item: NodeId) -> bool {
        self.dropdown
            .as_mut()
            .is_some_and(|d| d.on_item_activate(host, item))
    }

    /// Key press on a dropdown accordion item.
    pub fn on_item_key<H: Host>(&mut self, host: &mut H, item: NodeId, input: KeyInput) -> KeyOutcome {
        self.dropdown
            .as_mut()
            .map_or(KeyOutcome::IGNORED, |d| d.on_item_key(host, item, input))
    }

    /// Select a variant programmatically.
    pub fn on_variant_selected<H: Host>(&mut self, host: &mut H, variant: Variant) {
        if let Some(toggle) = self.variant.as_mut() {
            toggle.select(host, &mut self.store, variant);
        }
    }
}
