#![forbid(unsafe_code)]

//! pagefx core
//!
//! Deterministic page behavior derived from scroll offset, viewport size,
//! element geometry, and user input. Nothing in this crate touches a real
//! DOM: every platform effect flows through the traits in [`host`], so the
//! same controller runs in the browser (via `pagefx-web`) and in native
//! tests (via [`headless::HeadlessPage`]).
//!
//! # Key Components
//!
//! - [`VideoLifecycle`] - hero video play/pause/replay state machine
//! - [`TickerEngine`] - seamless marquee loop fill and animation parameters
//! - [`ScrollObservers`] - header solidify, progress bar, reveal-on-intersection
//! - [`DropdownController`] - focus-trapped dropdown with an accordion mode
//! - [`VariantToggle`] - persisted A/B implementation-variant switch
//! - [`SloganRotator`] - fixed-interval slogan cycling
//! - [`Orchestrator`] - routes host events to the owning component
//!
//! # Role in pagefx
//! The host (the web adapter, or a test) pushes events and answers geometry
//! queries; components derive state and write classes, styles, and
//! attributes back through the host. Every failure degrades to a static but
//! usable page (see [`error`]).

pub mod config;
pub mod debounce;
pub mod dropdown;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod observers;
pub mod orchestrator;
pub mod preference;
pub mod slogan;
pub mod startup;
pub mod ticker;
pub mod variant;
pub mod video;

pub use config::PageConfig;
pub use debounce::TrailingDebounce;
pub use dropdown::{
    DropdownController, DropdownParts, DropdownState, Key, KeyInput, KeyOutcome, Modifiers,
};
pub use error::{Degradation, Error, Result};
pub use geometry::{Layout, NodeId, Viewport};
pub use host::{
    Clock, Dom, Focus, Host, LoopHandle, LoopSpec, Media, PreferenceStore, Tracks, TrapHandle,
    WallClock,
};
pub use observers::{IntersectionEntry, ObserverOptions, RevealTarget, ScrollFrame, ScrollObservers};
pub use orchestrator::{Environment, Orchestrator, PageMap, SetupReport};
pub use preference::{MemoryStore, Variant};
pub use slogan::SloganRotator;
pub use startup::NavigationKind;
pub use ticker::{FillReport, LoopOutcome, TickerEngine};
pub use variant::{VariantParts, VariantToggle};
pub use video::{VideoLifecycle, VideoState};
