#![forbid(unsafe_code)]

//! `wasm-bindgen` exports: [`PageFx`] boots page behavior on the live
//! document and wires browser events to the orchestrator.
//!
//! Only compiled on `wasm32` targets.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use core::time::Duration;

use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use js_sys::{Array, Function, Reflect};
use pagefx_core::dropdown::DropdownParts;
use pagefx_core::observers::{IntersectionEntry, RevealTarget};
use pagefx_core::variant::VariantParts;
use pagefx_core::{
    Clock, Dom, Environment, KeyInput, KeyOutcome, NavigationKind, NodeId, Orchestrator, PageMap,
    Variant, WallClock,
};
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, FocusOptions, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent, ScrollBehavior,
    ScrollIntoViewOptions, Window,
};

use crate::dom::{DomPage, SignalSink, describe, key_input};
use crate::selectors::{
    BootOptions, PageSelectors, REDUCED_MOTION_QUERY, anchor_focus_delay, anchor_target,
    scroll_behavior,
};
use crate::storage::LocalStore;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_hooks() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
        // The host page may already have installed a subscriber.
        let _ = tracing_wasm::try_set_as_global_default();
    });
}

// ---------------------------------------------------------------------------
// Environment detection
// ---------------------------------------------------------------------------

fn prefers_reduced_motion(window: &Window) -> bool {
    let Ok(match_media) = Reflect::get(window, &"matchMedia".into()) else {
        return false;
    };
    let Ok(match_media) = match_media.dyn_into::<Function>() else {
        return false;
    };
    let Ok(query) = match_media.call1(window, &JsValue::from_str(REDUCED_MOTION_QUERY)) else {
        return false;
    };
    Reflect::get(&query, &"matches".into())
        .ok()
        .and_then(|m| m.as_bool())
        .unwrap_or(false)
}

fn navigation_kind(window: &Window) -> NavigationKind {
    let kind = (|| {
        let performance = Reflect::get(window, &"performance".into()).ok()?;
        let entries_by_type = Reflect::get(&performance, &"getEntriesByType".into())
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        let entries = entries_by_type
            .call1(&performance, &JsValue::from_str("navigation"))
            .ok()?
            .dyn_into::<Array>()
            .ok()?;
        Reflect::get(&entries.get(0), &"type".into()).ok()?.as_string()
    })();
    kind.map_or(NavigationKind::Unknown, |k| NavigationKind::parse(&k))
}

fn detect_environment(window: &Window) -> Environment {
    Environment {
        reduced_motion: prefers_reduced_motion(window),
        intersection_observer: Reflect::has(window, &"IntersectionObserver".into())
            .unwrap_or(false),
        navigation: navigation_kind(window),
    }
}

// ---------------------------------------------------------------------------
// Page map
// ---------------------------------------------------------------------------

fn variant_of(page: &DomPage, node: NodeId) -> Option<Variant> {
    let raw = page.element(node)?.get_attribute("data-variant")?;
    Variant::parse(&raw)
}

fn build_page_map(page: &DomPage, sel: &PageSelectors) -> PageMap {
    let reveal = page
        .query_all(None, &sel.reveal)
        .into_iter()
        .map(|node| {
            let card = page
                .element(node)
                .is_some_and(|el| el.class_list().contains(&sel.card_class));
            RevealTarget::new(node, card)
        })
        .collect();

    let dropdown = match (page.query(&sel.dropdown_toggle), page.query(&sel.dropdown_panel)) {
        (Some(toggle), Some(panel)) => Some(DropdownParts {
            toggle,
            panel,
            items: page.query_all(Some(panel), &sel.dropdown_item),
        }),
        _ => None,
    };

    let buttons = page
        .query_all(None, &sel.variant_button)
        .into_iter()
        .filter_map(|node| Some((node, variant_of(page, node)?)))
        .collect();
    let callouts = page.query_all(None, &sel.variant_callout);
    let blocks = callouts
        .iter()
        .flat_map(|&callout| page.query_all(Some(callout), &sel.variant_block))
        .filter_map(|node| Some((node, variant_of(page, node)?)))
        .collect();

    PageMap {
        header: page.query(&sel.header),
        hero: page.query(&sel.hero),
        video: page.query(&sel.video),
        progress: page.query(&sel.progress),
        reveal,
        tickers: page.query_all(None, &sel.ticker_track),
        dropdown,
        variant: VariantParts {
            buttons,
            callouts,
            blocks,
            live_region: page.query(&sel.live_region),
        },
        slogans: page.query_all(None, &sel.slogan),
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

struct PageState {
    orch: Orchestrator<LocalStore>,
    page: DomPage,
}

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// Shared state behind every listener. Listeners hold it weakly.
struct Runtime {
    state: RefCell<PageState>,
    selectors: PageSelectors,
    clock: WallClock,
    timer: RefCell<Option<Timeout>>,
    focus_timer: RefCell<Option<Timeout>>,
    listeners: RefCell<Vec<EventListener>>,
    observer: RefCell<Option<(IntersectionObserver, ObserverCallback)>>,
    stopped: Cell<bool>,
}

impl SignalSink for Runtime {
    fn trap_key(&self, input: KeyInput) -> KeyOutcome {
        self.with(|orch, page| orch.on_trap_key(page, input))
            .unwrap_or(KeyOutcome::IGNORED)
    }

    fn play_rejected(&self) {
        self.with(|orch, _| orch.on_play_rejected());
    }
}

impl Runtime {
    fn boot(window: Window, document: Document, options: BootOptions) -> Rc<Self> {
        let env = detect_environment(&window);
        let store = LocalStore::open(&window);
        let runtime = Rc::new_cyclic(|weak: &Weak<Self>| {
            let sink: Weak<dyn SignalSink> = weak.clone();
            let page = DomPage::new(window, document, sink);
            let map = build_page_map(&page, &options.selectors);
            page.pin();
            Self {
                state: RefCell::new(PageState {
                    orch: Orchestrator::new(map, options.config, env, store),
                    page,
                }),
                selectors: options.selectors,
                clock: WallClock::new(),
                timer: RefCell::new(None),
                focus_timer: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                observer: RefCell::new(None),
                stopped: Cell::new(false),
            }
        });
        runtime.start(env);
        runtime
    }

    /// Run `f` against the orchestrator and page. `None` if the state is
    /// already borrowed further up the stack or the runtime stopped.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut Orchestrator<LocalStore>, &mut DomPage) -> R,
    ) -> Option<R> {
        if self.stopped.get() {
            return None;
        }
        let mut state = self.state.try_borrow_mut().ok()?;
        let PageState { orch, page } = &mut *state;
        Some(f(orch, page))
    }

    fn start(self: &Rc<Self>, env: Environment) {
        let now = self.clock.now_mono();
        let Some(report) = self.with(|orch, page| {
            let report = orch.setup(page, now);
            decorate_static(page, &self.selectors);
            report
        }) else {
            return;
        };

        if let Some(options) = report.observer_options.filter(|_| !report.observe.is_empty()) {
            self.observe(&report.observe, &options.root_margin, options.threshold);
        }
        self.bind_window();
        self.bind_document();
        self.bind_video();
        self.bind_accordion_items();
        self.bind_anchors(env.reduced_motion);
        self.schedule();
        info!(
            reduced_motion = env.reduced_motion,
            navigation = ?env.navigation,
            "pagefx attached"
        );
    }

    fn listen(
        self: &Rc<Self>,
        target: &web_sys::EventTarget,
        event: &'static str,
        handler: impl Fn(&Rc<Self>, &Event) + 'static,
    ) {
        let weak = Rc::downgrade(self);
        let listener = EventListener::new_with_options(
            target,
            event,
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                if let Some(rt) = weak.upgrade() {
                    handler(&rt, event);
                }
            },
        );
        self.listeners.borrow_mut().push(listener);
    }

    fn bind_window(self: &Rc<Self>) {
        let window = self.state.borrow().page.window().clone();
        // Scroll listeners stay passive.
        let weak = Rc::downgrade(self);
        let scroll = EventListener::new(&window, "scroll", move |_| {
            if let Some(rt) = weak.upgrade() {
                rt.with(|orch, page| orch.on_scroll(page));
            }
        });
        self.listeners.borrow_mut().push(scroll);

        self.listen(&window, "resize", |rt, _| {
            let now = rt.clock.now_mono();
            rt.with(|orch, page| orch.on_resize(page, now));
            rt.schedule();
        });
        self.listen(&window, "load", |rt, _| {
            rt.with(|orch, page| orch.on_load(page));
        });
    }

    fn bind_document(self: &Rc<Self>) {
        let document = self.state.borrow().page.document().clone();
        self.listen(&document, "click", |rt, event| {
            let Some(target) = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
            else {
                return;
            };
            // Clicks inside a variant button count as clicks on the button.
            let target = target
                .closest(&rt.selectors.variant_button)
                .ok()
                .flatten()
                .unwrap_or(target);
            rt.with(|orch, page| {
                let node = page.register(&target);
                orch.on_click(page, node);
            });
        });
        self.listen(&document, "keydown", |rt, event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let outcome = rt.with(|orch, page| orch.on_keydown(page, key_input(event)));
            if outcome.is_some_and(|o| o.prevent_default) {
                event.prevent_default();
            }
        });
    }

    fn bind_video(self: &Rc<Self>) {
        let Some(video) = self.element_for(&self.selectors.video) else {
            return;
        };
        self.listen(&video, "playing", |rt, _| {
            rt.with(|orch, page| orch.on_video_playing(page));
        });
        self.listen(&video, "ended", |rt, _| {
            rt.with(|orch, page| orch.on_video_ended(page));
        });
    }

    fn bind_accordion_items(self: &Rc<Self>) {
        let items: Vec<(NodeId, Element)> = {
            let state = self.state.borrow();
            let Some(dropdown) = state.orch.dropdown() else {
                return;
            };
            dropdown
                .parts()
                .items
                .iter()
                .filter_map(|&id| Some((id, state.page.element(id)?)))
                .collect()
        };
        for (id, element) in items {
            self.listen(&element, "click", move |rt, event| {
                if rt.with(|orch, page| orch.on_item_activate(page, id)) == Some(true) {
                    event.prevent_default();
                }
            });
            self.listen(&element, "keydown", move |rt, event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let outcome = rt.with(|orch, page| orch.on_item_key(page, id, key_input(event)));
                if outcome.is_some_and(|o| o.prevent_default) {
                    event.prevent_default();
                }
            });
        }
    }

    fn bind_anchors(self: &Rc<Self>, reduced_motion: bool) {
        let anchors = {
            let state = self.state.borrow();
            state
                .page
                .document()
                .query_selector_all(&self.selectors.anchor)
        };
        let Ok(anchors) = anchors else {
            return;
        };
        for i in 0..anchors.length() {
            let Some(anchor) = anchors.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let target = anchor.clone();
            self.listen(&anchor, "click", move |rt, event| {
                let Some(href) = target.get_attribute("href") else {
                    return;
                };
                let Some(selector) = anchor_target(&href) else {
                    return;
                };
                let destination = rt
                    .state
                    .borrow()
                    .page
                    .document()
                    .query_selector(selector)
                    .ok()
                    .flatten();
                if let Some(destination) = destination {
                    event.prevent_default();
                    rt.scroll_and_focus(&destination, reduced_motion);
                }
            });
        }
    }

    /// Scroll to an anchor target and focus it once the scroll settles.
    /// A newer anchor click cancels a pending focus.
    fn scroll_and_focus(&self, destination: &Element, reduced_motion: bool) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(match scroll_behavior(reduced_motion) {
            "smooth" => ScrollBehavior::Smooth,
            _ => ScrollBehavior::Auto,
        });
        destination.scroll_into_view_with_scroll_into_view_options(&options);

        let mut pending = self.focus_timer.borrow_mut();
        *pending = None;
        let Ok(destination) = destination.clone().dyn_into::<HtmlElement>() else {
            return;
        };
        let millis = timeout_millis(anchor_focus_delay(reduced_motion));
        *pending = Some(Timeout::new(millis, move || {
            let options = FocusOptions::new();
            options.set_prevent_scroll(true);
            let _ = destination.focus_with_options(&options);
        }));
    }

    fn element_for(&self, selector: &str) -> Option<Element> {
        self.state
            .borrow()
            .page
            .document()
            .query_selector(selector)
            .ok()
            .flatten()
    }

    // -----------------------------------------------------------------------
    // Reveal observer
    // -----------------------------------------------------------------------

    fn observe(self: &Rc<Self>, nodes: &[NodeId], root_margin: &str, threshold: f64) {
        let weak = Rc::downgrade(self);
        let callback: ObserverCallback = Closure::new(
            move |entries: Array, observer: IntersectionObserver| {
                if let Some(rt) = weak.upgrade() {
                    rt.on_intersections(&entries, &observer);
                }
            },
        );
        let init = IntersectionObserverInit::new();
        init.set_root_margin(root_margin);
        init.set_threshold(&JsValue::from_f64(threshold));

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                {
                    let state = self.state.borrow();
                    for &node in nodes {
                        if let Some(element) = state.page.element(node) {
                            observer.observe(&element);
                        }
                    }
                }
                *self.observer.borrow_mut() = Some((observer, callback));
            }
            Err(err) => {
                warn!(error = %describe(&err), "IntersectionObserver rejected, revealing all");
                let entries: Vec<IntersectionEntry> = nodes
                    .iter()
                    .map(|&target| IntersectionEntry {
                        target,
                        is_intersecting: true,
                        ratio: 1.0,
                    })
                    .collect();
                self.with(|orch, page| orch.on_intersections(page, &entries));
            }
        }
    }

    fn on_intersections(&self, entries: &Array, observer: &IntersectionObserver) {
        let settled = self.with(|orch, page| {
            let batch: Vec<IntersectionEntry> = entries
                .iter()
                .filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| IntersectionEntry {
                    target: page.register(&entry.target()),
                    is_intersecting: entry.is_intersecting(),
                    ratio: entry.intersection_ratio(),
                })
                .collect();
            for node in orch.on_intersections(page, &batch) {
                if let Some(element) = page.element(node) {
                    observer.unobserve(&element);
                }
            }
            orch.observers().reveal().is_settled()
        });
        if settled == Some(true) {
            observer.disconnect();
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Arm one timeout for the orchestrator's next deadline, replacing any
    /// pending one.
    fn schedule(self: &Rc<Self>) {
        let deadline = self.with(|orch, _| orch.next_deadline()).flatten();
        let mut timer = self.timer.borrow_mut();
        *timer = None;
        let Some(deadline) = deadline else {
            return;
        };
        let delay = deadline.saturating_sub(self.clock.now_mono());
        let millis = timeout_millis(delay);
        let weak = Rc::downgrade(self);
        *timer = Some(Timeout::new(millis, move || {
            if let Some(rt) = weak.upgrade() {
                rt.fire();
            }
        }));
    }

    fn fire(self: &Rc<Self>) {
        let now = self.clock.now_mono();
        self.with(|orch, page| orch.on_timer(page, now));
        // The firing Timeout must outlive its own callback.
        let rt = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            rt.schedule();
        });
    }

    fn shutdown(&self) {
        self.with(|orch, page| orch.teardown(page));
        self.stopped.set(true);
        self.timer.borrow_mut().take();
        self.focus_timer.borrow_mut().take();
        self.listeners.borrow_mut().clear();
        if let Some((observer, _callback)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
        debug!("pagefx detached");
    }
}

/// One-shot decoration that needs no state: the footer year and focusable
/// sections.
fn decorate_static(page: &mut DomPage, sel: &PageSelectors) {
    if let Some(year) = page.query(&sel.year) {
        let now = js_sys::Date::new_0();
        page.set_text(year, &now.get_full_year().to_string());
    }
    for section in page.query_all(None, &sel.section) {
        page.set_attribute(section, "tabindex", "-1");
    }
}

/// Browsers fire timeouts above `i32::MAX` ms immediately.
fn timeout_millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).map_or(TIMEOUT_MAX_MS, |ms| ms.min(TIMEOUT_MAX_MS))
}

const TIMEOUT_MAX_MS: u32 = i32::MAX as u32;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Page behavior bound to the current document.
///
/// ```js
/// const fx = new PageFx(JSON.stringify({ selectors: { hero: "#top" } }));
/// // later
/// fx.destroy();
/// ```
#[wasm_bindgen]
pub struct PageFx {
    runtime: Option<Rc<Runtime>>,
}

#[wasm_bindgen]
impl PageFx {
    /// Attach to `window.document`. `options` is an optional JSON document
    /// with `config` and `selectors` sections.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<String>) -> Result<PageFx, JsValue> {
        install_hooks();
        let options = BootOptions::from_json(options.as_deref())
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            runtime: Some(Runtime::boot(window, document, options)),
        })
    }

    /// The active implementation variant (`"A"` or `"B"`), if the page has
    /// a variant toggle.
    pub fn variant(&self) -> Option<String> {
        let runtime = self.runtime.as_ref()?;
        let state = runtime.state.try_borrow().ok()?;
        state
            .orch
            .variant()
            .map(|toggle| toggle.current().as_str().to_string())
    }

    /// Select a variant programmatically. Returns `false` for an unknown
    /// variant name.
    #[wasm_bindgen(js_name = selectVariant)]
    pub fn select_variant(&self, variant: &str) -> bool {
        let (Some(runtime), Some(variant)) = (self.runtime.as_ref(), Variant::parse(variant))
        else {
            return false;
        };
        runtime
            .with(|orch, page| orch.on_variant_selected(page, variant))
            .is_some()
    }

    /// Detach every listener, observer, timer, and animation.
    pub fn destroy(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown();
        }
    }
}

impl Drop for PageFx {
    fn drop(&mut self) {
        self.destroy();
    }
}
