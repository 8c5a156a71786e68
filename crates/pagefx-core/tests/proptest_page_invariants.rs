#![forbid(unsafe_code)]

//! Property-based invariant tests for the page controllers.
//!
//! ## Invariants
//!
//! 1. Header solid flag: `solid <=> scroll_y > hero_height - offset`
//! 2. Progress: within `[0, 100]` across the scrollable range, monotonic in
//!    the scroll offset, never panics for negative or huge offsets
//! 3. Replay gate: idempotent while its preconditions are false
//! 4. Replay gate: a replay clears the scrolled flag
//! 5. Ticker fill: terminates within the pass cap and covers `2 * parent`
//! 6. Ticker refill: unchanged geometry reproduces the same children
//! 7. Ticker fill: content is always two identical halves
//! 8. Dropdown: focus stays inside the panel for any Tab sequence while open
//! 9. Dropdown: Escape always closes and releases the trap

use core::time::Duration;

use pagefx_core::config::{HeaderConfig, TickerConfig, VideoConfig};
use pagefx_core::dropdown::{DropdownController, DropdownParts, DropdownState, Key, KeyInput, Modifiers};
use pagefx_core::headless::HeadlessPage;
use pagefx_core::observers::{header_is_solid, progress_percent};
use pagefx_core::ticker::canonical_unit;
use pagefx_core::{Dom, Focus, Layout, NodeId, TickerEngine, Tracks, VideoLifecycle, VideoState, Viewport};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_viewport() -> impl Strategy<Value = Viewport> {
    (200.0f64..2000.0, 0.0f64..20_000.0).prop_map(|(height, extra)| Viewport {
        scroll_y: 0.0,
        width: 1280.0,
        height,
        scroll_height: height + extra,
        client_height: height,
    })
}

fn arb_markup() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,6}", 1..6).prop_map(|labels| {
        labels
            .into_iter()
            .enumerate()
            .map(|(i, l)| format!("<li data-i=\"{i}\">{l}</li>"))
            .collect()
    })
}

#[derive(Debug, Clone, Copy)]
enum TabKey {
    Forward,
    Backward,
}

fn arb_tabs() -> impl Strategy<Value = Vec<TabKey>> {
    prop::collection::vec(
        prop_oneof![Just(TabKey::Forward), Just(TabKey::Backward)],
        0..40,
    )
}

const TRACK: NodeId = NodeId::new(100);
const VIDEO: NodeId = NodeId::new(200);

fn ticker_page(markup: &[String], child_width: f64, parent_width: f64) -> HeadlessPage {
    let mut page = HeadlessPage::default();
    page.set_default_child_width(child_width);
    page.set_parent_width(TRACK, parent_width);
    page.set_children(TRACK, markup);
    page
}

// ── 1. Header boundary ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn header_solid_iff_past_threshold(
        scroll_y in -500.0f64..5000.0,
        hero in 0.0f64..2000.0,
        offset in 0.0f64..200.0,
    ) {
        prop_assert_eq!(header_is_solid(scroll_y, hero, offset), scroll_y > hero - offset);
    }

    #[test]
    fn header_boundary_itself_is_not_solid(hero in 80.0f64..2000.0) {
        let offset = HeaderConfig::default().solid_offset_px;
        prop_assert!(!header_is_solid(hero - offset, hero, offset));
    }
}

// ── 2. Progress range and monotonicity ────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn progress_in_range(vp in arb_viewport(), t in 0.0f64..=1.0) {
        let vp = vp.at(vp.document_scrollable() * t);
        let pct = progress_percent(&vp);
        prop_assert!((0.0..=100.0).contains(&pct), "pct={pct}");
    }

    #[test]
    fn progress_monotonic(vp in arb_viewport(), a in 0.0f64..20_000.0, b in 0.0f64..20_000.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(progress_percent(&vp.at(lo)) <= progress_percent(&vp.at(hi)));
    }

    #[test]
    fn progress_never_panics(vp in arb_viewport(), scroll_y in -1.0e9f64..1.0e9) {
        let pct = progress_percent(&vp.at(scroll_y));
        prop_assert!(!pct.is_nan());
    }
}

// ── 3-4. Replay gate ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn replay_gate_idle_while_not_completed(
        offsets in prop::collection::vec(0.0f64..3000.0, 1..30),
    ) {
        let mut page = HeadlessPage::default();
        let mut video = VideoLifecycle::new(Some(VIDEO), &VideoConfig::default());
        video.on_playing(&mut page);
        let base = Viewport { height: 800.0, scroll_height: 5000.0, client_height: 800.0, ..Viewport::default() };
        for y in offsets {
            prop_assert!(!video.on_scroll(&mut page, &base.at(y)));
            prop_assert_eq!(video.state(), VideoState::Playing);
        }
        prop_assert!(page.media_calls().is_empty());
    }

    #[test]
    fn replay_gate_idle_without_scrolling_a_viewport(
        offsets in prop::collection::vec(0.0f64..799.0, 1..30),
    ) {
        let mut page = HeadlessPage::default();
        let mut video = VideoLifecycle::new(Some(VIDEO), &VideoConfig::default());
        video.on_ended(&mut page);
        let base = Viewport { height: 800.0, scroll_height: 5000.0, client_height: 800.0, ..Viewport::default() };
        for y in offsets {
            prop_assert!(!video.on_scroll(&mut page, &base.at(y)));
        }
        prop_assert_eq!(video.state(), VideoState::Completed);
    }

    #[test]
    fn replay_clears_scrolled_flag(
        offsets in prop::collection::vec(0.0f64..3000.0, 1..60),
    ) {
        let mut page = HeadlessPage::default();
        let mut video = VideoLifecycle::new(Some(VIDEO), &VideoConfig::default());
        video.on_ended(&mut page);
        let base = Viewport { height: 800.0, scroll_height: 5000.0, client_height: 800.0, ..Viewport::default() };
        for y in offsets {
            let was_armed = video.has_scrolled_one_viewport() || y >= 800.0;
            let was_completed = video.state() == VideoState::Completed;
            let replayed = video.on_scroll(&mut page, &base.at(y));
            prop_assert_eq!(replayed, was_armed && was_completed && y < 120.0);
            if replayed {
                prop_assert!(!video.has_scrolled_one_viewport());
                prop_assert_eq!(video.state(), VideoState::Idle);
            }
        }
    }
}

// ── 5-7. Ticker fill ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fill_terminates_and_covers_twice_the_parent(
        markup in arb_markup(),
        child_width in 1.0f64..400.0,
        parent_width in 1.0f64..4000.0,
    ) {
        let config = TickerConfig::default();
        let mut page = ticker_page(&markup, child_width, parent_width);
        let mut engine = TickerEngine::new([TRACK], &config, false);
        let reports = engine.refresh(&mut page);

        prop_assert_eq!(reports.len(), 1);
        let report = reports[0];
        prop_assert!(report.passes >= 1 && report.passes <= config.max_fill_passes);
        prop_assert!(page.scroll_width(TRACK) >= 2.0 * parent_width);
        prop_assert!(report.duration >= config.min_duration());
    }

    #[test]
    fn refill_with_unchanged_geometry_is_stable(
        markup in arb_markup(),
        child_width in 1.0f64..400.0,
        parent_width in 1.0f64..4000.0,
        refills in 1usize..5,
    ) {
        let mut page = ticker_page(&markup, child_width, parent_width);
        let mut engine = TickerEngine::new([TRACK], &TickerConfig::default(), false);
        engine.refresh(&mut page);
        let first = page.child_markup(TRACK);
        for _ in 0..refills {
            engine.refresh(&mut page);
            prop_assert_eq!(&page.child_markup(TRACK), &first);
        }
        prop_assert_eq!(page.active_loops().len(), 1);
    }

    #[test]
    fn filled_content_is_two_identical_halves(
        markup in arb_markup(),
        child_width in 1.0f64..400.0,
        parent_width in 0.0f64..4000.0,
    ) {
        let mut page = ticker_page(&markup, child_width, parent_width);
        let mut engine = TickerEngine::new([TRACK], &TickerConfig::default(), false);
        engine.refresh(&mut page);
        let children = page.child_markup(TRACK);
        prop_assert_eq!(canonical_unit(&children).len() * 2, children.len());
    }

    #[test]
    fn zero_width_layout_stops_after_one_pass(
        markup in arb_markup(),
        parent_width in 1.0f64..4000.0,
    ) {
        let mut page = ticker_page(&markup, 0.0, parent_width);
        let mut engine = TickerEngine::new([TRACK], &TickerConfig::default(), false);
        let reports = engine.refresh(&mut page);
        prop_assert_eq!(reports[0].passes, 1);
        prop_assert_eq!(page.child_markup(TRACK).len(), markup.len() * 2);
        prop_assert!(page.active_loops().is_empty());
    }
}

// ── 8-9. Dropdown focus trap ──────────────────────────────────────────────

const TOGGLE: NodeId = NodeId::new(1);
const PANEL: NodeId = NodeId::new(2);
const BEFORE: NodeId = NodeId::new(3);
const AFTER: NodeId = NodeId::new(4);

fn dropdown_page(links: u32) -> (HeadlessPage, Vec<NodeId>) {
    let mut page = HeadlessPage::default();
    page.push_focusable(BEFORE);
    page.push_focusable(TOGGLE);
    let items: Vec<NodeId> = (10..10 + links).map(NodeId::new).collect();
    for &item in &items {
        page.attach(item, PANEL);
        page.push_focusable(item);
    }
    page.push_focusable(AFTER);
    (page, items)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn focus_never_leaves_open_dropdown(links in 1u32..6, tabs in arb_tabs()) {
        let (mut page, items) = dropdown_page(links);
        let parts = DropdownParts { toggle: TOGGLE, panel: PANEL, items: items.clone() };
        let mut dropdown = DropdownController::new(parts, &Default::default());
        dropdown.open(&mut page);

        for tab in tabs {
            let input = match tab {
                TabKey::Forward => KeyInput::new(Key::Tab),
                TabKey::Backward => KeyInput::new(Key::Tab).with_modifiers(Modifiers::SHIFT),
            };
            let outcome = dropdown.on_trap_key(&mut page, input);
            if !outcome.prevent_default {
                page.advance_focus(matches!(tab, TabKey::Backward));
            }
            let active = page.active_element();
            prop_assert!(
                active.is_some_and(|a| items.contains(&a)),
                "focus escaped to {active:?}"
            );
        }
    }

    #[test]
    fn escape_always_closes(links in 0u32..6, tabs in arb_tabs(), focus_inside in any::<bool>()) {
        let (mut page, items) = dropdown_page(links);
        let parts = DropdownParts { toggle: TOGGLE, panel: PANEL, items };
        let mut dropdown = DropdownController::new(parts, &Default::default());
        dropdown.open(&mut page);
        for tab in tabs {
            let input = KeyInput::new(Key::Tab).with_modifiers(match tab {
                TabKey::Forward => Modifiers::empty(),
                TabKey::Backward => Modifiers::SHIFT,
            });
            dropdown.on_trap_key(&mut page, input);
        }
        if !focus_inside {
            page.set_active(Some(AFTER));
        }
        let inside = page.active_element().is_some_and(|a| page.contains(PANEL, a));

        dropdown.on_escape(&mut page);
        prop_assert_eq!(dropdown.state(), DropdownState::Closed);
        prop_assert_eq!(page.active_traps(), 0);
        prop_assert!(!page.has_class(PANEL, "open"));
        if inside {
            prop_assert_eq!(page.active_element(), Some(TOGGLE));
        }
    }
}

#[test]
fn debounced_refill_only_runs_after_quiet_period() {
    let markup = vec!["<li>a</li>".to_string()];
    let mut page = ticker_page(&markup, 100.0, 500.0);
    let mut engine = TickerEngine::new([TRACK], &TickerConfig::default(), false);
    engine.refresh(&mut page);
    let appends = page.append_calls();

    for ms in [0u64, 50, 100, 150] {
        engine.request_refresh(Duration::from_millis(ms));
        assert!(engine.poll(&mut page, Duration::from_millis(ms + 10)).is_none());
    }
    assert_eq!(page.append_calls(), appends);
    assert!(engine.poll(&mut page, Duration::from_millis(290)).is_some());
    assert!(page.append_calls() > appends);
}
