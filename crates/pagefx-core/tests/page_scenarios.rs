#![forbid(unsafe_code)]

//! End-to-end scenarios driven through the orchestrator on a headless page.
//!
//! Run:
//!   cargo test -p pagefx-core --test page_scenarios

use core::time::Duration;

use pagefx_core::dropdown::{DropdownParts, DropdownState, Key, KeyInput, Modifiers};
use pagefx_core::headless::{HeadlessPage, MediaCall};
use pagefx_core::observers::{IntersectionEntry, RevealTarget};
use pagefx_core::ticker::LoopOutcome;
use pagefx_core::variant::VariantParts;
use pagefx_core::{
    Dom, Environment, Focus, MemoryStore, NavigationKind, NodeId, Orchestrator, PageConfig,
    PageMap, PreferenceStore, Variant, VideoState, Viewport,
};
use pagefx_core::config::SloganConfig;
use pretty_assertions::assert_eq;

// ============================================================================
// Page fixture
// ============================================================================

const HEADER: NodeId = NodeId::new(1);
const HERO: NodeId = NodeId::new(2);
const VIDEO: NodeId = NodeId::new(3);
const BAR: NodeId = NodeId::new(4);
const FEATURE: NodeId = NodeId::new(5);
const CARD: NodeId = NodeId::new(6);
const TRACK: NodeId = NodeId::new(7);
const TOGGLE: NodeId = NodeId::new(8);
const PANEL: NodeId = NodeId::new(9);
const LINK_1: NodeId = NodeId::new(10);
const LINK_2: NodeId = NodeId::new(11);
const BTN_A: NodeId = NodeId::new(12);
const BTN_B: NodeId = NodeId::new(13);
const CALLOUT: NodeId = NodeId::new(14);
const BLOCK_A: NodeId = NodeId::new(15);
const BLOCK_B: NodeId = NodeId::new(16);
const LIVE: NodeId = NodeId::new(17);
const SLOGAN_1: NodeId = NodeId::new(18);
const SLOGAN_2: NodeId = NodeId::new(19);
const BODY_TEXT: NodeId = NodeId::new(20);

fn headless_page() -> HeadlessPage {
    let mut page = HeadlessPage::new(Viewport {
        scroll_y: 0.0,
        width: 1280.0,
        height: 800.0,
        scroll_height: 4800.0,
        client_height: 800.0,
    });
    page.set_height(HERO, 700.0);
    page.set_parent_width(TRACK, 1200.0);
    page.set_default_child_width(150.0);
    page.set_children(
        TRACK,
        &["<li>fast</li>", "<li>typed</li>", "<li>tested</li>"],
    );
    page.attach(LINK_1, PANEL);
    page.attach(LINK_2, PANEL);
    for node in [TOGGLE, LINK_1, LINK_2, BTN_A, BTN_B] {
        page.push_focusable(node);
    }
    page
}

fn page_map() -> PageMap {
    PageMap {
        header: Some(HEADER),
        hero: Some(HERO),
        video: Some(VIDEO),
        progress: Some(BAR),
        reveal: vec![
            RevealTarget::new(FEATURE, false),
            RevealTarget::new(CARD, true),
        ],
        tickers: vec![TRACK],
        dropdown: Some(DropdownParts {
            toggle: TOGGLE,
            panel: PANEL,
            items: vec![LINK_1, LINK_2],
        }),
        variant: VariantParts {
            buttons: vec![(BTN_A, Variant::A), (BTN_B, Variant::B)],
            callouts: vec![CALLOUT],
            blocks: vec![(BLOCK_A, Variant::A), (BLOCK_B, Variant::B)],
            live_region: Some(LIVE),
        },
        slogans: vec![SLOGAN_1, SLOGAN_2],
    }
}

fn scroll_to(orch: &mut Orchestrator, page: &mut HeadlessPage, y: f64) {
    page.set_scroll_y(y);
    orch.on_scroll(page);
}

// ============================================================================
// Replay gate scenario
// ============================================================================

#[test]
fn replay_fires_on_first_tick_after_ended_once_scrolled() {
    let mut page = headless_page();
    let mut orch = Orchestrator::new(
        page_map(),
        PageConfig::default(),
        Environment::default(),
        MemoryStore::new(),
    );
    orch.setup(&mut page, Duration::ZERO);
    orch.on_video_playing(&mut page);

    scroll_to(&mut orch, &mut page, 0.0);
    scroll_to(&mut orch, &mut page, 1000.0);
    assert_eq!(orch.video().state(), VideoState::Playing);
    assert!(orch.video().has_scrolled_one_viewport());

    scroll_to(&mut orch, &mut page, 50.0);
    assert_eq!(orch.video().state(), VideoState::Playing);
    assert_eq!(page.media_calls(), &[MediaCall::Play(VIDEO)]);

    orch.on_video_ended(&mut page);
    assert_eq!(orch.video().state(), VideoState::Completed);

    scroll_to(&mut orch, &mut page, 50.0);
    assert_eq!(orch.video().state(), VideoState::Idle);
    assert!(!orch.video().has_scrolled_one_viewport());
    assert_eq!(
        page.media_calls(),
        &[
            MediaCall::Play(VIDEO),
            MediaCall::Pause(VIDEO),
            MediaCall::SeekToStart(VIDEO),
            MediaCall::Play(VIDEO),
        ]
    );
    assert_eq!(page.classes(VIDEO), vec!["play-visible"]);

    // The next replay needs another trip down the page.
    orch.on_video_playing(&mut page);
    orch.on_video_ended(&mut page);
    scroll_to(&mut orch, &mut page, 10.0);
    assert_eq!(orch.video().state(), VideoState::Completed);
}

// ============================================================================
// Full page walk-through
// ============================================================================

#[test]
fn full_page_walkthrough() {
    let mut page = headless_page();
    let mut store = MemoryStore::new();
    store.store("implVariant", "B").unwrap();
    let mut orch = Orchestrator::new(
        page_map(),
        PageConfig::default(),
        Environment::default(),
        store,
    );

    let report = orch.setup(&mut page, Duration::ZERO);
    assert_eq!(report.observe, vec![FEATURE, CARD]);
    assert_eq!(report.variant, Some(Variant::B));
    assert_eq!(report.tickers[0].outcome, LoopOutcome::Animated);
    assert_eq!(page.attribute(BTN_B, "aria-pressed"), Some("true"));
    assert_eq!(page.style(BLOCK_A, "display"), Some("none"));
    assert_eq!(page.classes(SLOGAN_1), vec!["active"]);

    // Reveal one element; the other stays pending.
    let done = orch.on_intersections(
        &mut page,
        &[IntersectionEntry {
            target: CARD,
            is_intersecting: true,
            ratio: 0.2,
        }],
    );
    assert_eq!(done, vec![CARD]);
    assert_eq!(page.classes(CARD), vec!["pop-in", "visible"]);
    assert_eq!(orch.observers().reveal().pending(), vec![FEATURE]);

    // Header and progress follow the scroll offset.
    scroll_to(&mut orch, &mut page, 620.0);
    assert_eq!(page.classes(HEADER), Vec::<&str>::new());
    scroll_to(&mut orch, &mut page, 621.0);
    assert_eq!(page.classes(HEADER), vec!["solid"]);
    scroll_to(&mut orch, &mut page, 4000.0);
    assert_eq!(page.style(BAR, "width"), Some("100%"));

    // Dropdown: open, wrap, outside click closes without stealing focus.
    orch.on_click(&mut page, TOGGLE);
    assert_eq!(page.active_element(), Some(LINK_1));
    let shift_tab = KeyInput::new(Key::Tab).with_modifiers(Modifiers::SHIFT);
    assert!(orch.on_trap_key(&mut page, shift_tab).prevent_default);
    assert_eq!(page.active_element(), Some(LINK_2));
    page.set_active(Some(BODY_TEXT));
    orch.on_click(&mut page, BODY_TEXT);
    assert_eq!(
        orch.dropdown().map(|d| d.state()),
        Some(DropdownState::Closed)
    );
    assert_eq!(page.active_element(), Some(BODY_TEXT));
    assert_eq!(page.active_traps(), 0);

    // Variant switch persists and announces.
    orch.on_click(&mut page, BTN_A);
    assert_eq!(orch.store().get("implVariant"), Some("A"));
    assert_eq!(page.text(LIVE), Some("Showing implementation variant A"));
    assert_eq!(page.style(BLOCK_A, "display"), Some("block"));

    // Slogans rotate on the timer the host schedules.
    let due = orch.next_deadline().unwrap();
    orch.on_timer(&mut page, due);
    assert_eq!(page.classes(SLOGAN_1), Vec::<&str>::new());
    assert_eq!(page.classes(SLOGAN_2), vec!["active"]);

    // Narrow viewport switches the dropdown into accordion mode.
    page.set_viewport_width(600.0);
    orch.on_resize(&mut page, due);
    assert!(orch.on_item_activate(&mut page, LINK_1));
    assert_eq!(page.classes(LINK_1), vec!["expanded"]);

    orch.teardown(&mut page);
    assert!(page.active_loops().is_empty());
}

// ============================================================================
// Degraded environments
// ============================================================================

#[test]
fn hostile_environment_still_yields_usable_page() {
    let mut page = headless_page();
    page.deny_playback(true);
    page.disable_animations(true);
    let mut orch = Orchestrator::new(
        page_map(),
        PageConfig::default(),
        Environment {
            reduced_motion: false,
            intersection_observer: false,
            navigation: NavigationKind::Unknown,
        },
        MemoryStore::unavailable(),
    );

    let report = orch.setup(&mut page, Duration::ZERO);
    assert!(!report.scroll_reset);
    assert_eq!(report.variant, Some(Variant::A));
    assert_eq!(report.tickers[0].outcome, LoopOutcome::CssFallback);
    assert!(page.style(TRACK, "--ticker-duration").is_some());
    assert!(page.has_class(FEATURE, "visible"));
    assert!(orch.video().retry_armed());

    page.deny_playback(false);
    orch.on_keydown(&mut page, KeyInput::new(Key::Other));
    assert!(!orch.video().retry_armed());
    assert_eq!(
        page.media_calls(),
        &[MediaCall::Play(VIDEO), MediaCall::Play(VIDEO)]
    );

    orch.on_click(&mut page, BTN_B);
    assert_eq!(orch.variant().map(|v| v.current()), Some(Variant::B));
}

#[test]
fn page_without_optional_elements_is_inert() {
    let mut page = HeadlessPage::new(Viewport {
        height: 800.0,
        scroll_height: 800.0,
        client_height: 800.0,
        ..Viewport::default()
    });
    let mut orch = Orchestrator::new(
        PageMap::default(),
        PageConfig::default(),
        Environment::default(),
        MemoryStore::new(),
    );
    let report = orch.setup(&mut page, Duration::ZERO);
    assert_eq!(report.observe, Vec::<NodeId>::new());
    assert_eq!(report.tickers, Vec::new());
    assert_eq!(report.variant, None);
    let frame = orch.on_scroll(&mut page);
    assert_eq!(frame.header_solid, None);
    assert_eq!(frame.progress_pct, None);
    orch.on_click(&mut page, NodeId::new(99));
    orch.on_keydown(&mut page, KeyInput::new(Key::Escape));
    assert_eq!(orch.next_deadline(), None);
    assert!(page.media_calls().is_empty());
}

#[test]
fn zero_slogan_interval_leaves_slogans_static() {
    let mut page = headless_page();
    let config = PageConfig {
        slogan: SloganConfig {
            display_ms: 0,
            transition_ms: 0,
        },
        ..PageConfig::default()
    };
    let map = PageMap {
        slogans: vec![SLOGAN_1, SLOGAN_2],
        ..PageMap::default()
    };
    let mut orch = Orchestrator::new(map, config, Environment::default(), MemoryStore::new());
    orch.setup(&mut page, Duration::ZERO);
    assert!(orch.slogan().is_none());
    assert_eq!(orch.next_deadline(), None);

    orch.on_timer(&mut page, Duration::from_millis(1));
    assert_eq!(page.classes(SLOGAN_1), Vec::<&str>::new());
    assert_eq!(page.classes(SLOGAN_2), Vec::<&str>::new());
}
