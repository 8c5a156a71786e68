#![forbid(unsafe_code)]

//! `web-sys` implementation of the pagefx host traits.
//!
//! [`DomPage`] keeps a registry mapping [`NodeId`]s to live elements.
//! Elements are registered when the page map is built and lazily whenever
//! an event target or the focused element needs an id. Lookups go through a
//! `WeakMap` keyed by element. Lazily registered elements that have left the
//! document give their slot back on the next miss; page map slots are pinned.
//!
//! Two host resources outlive a single call and report back later: the
//! dropdown's keyboard trap (a `keydown` listener) and the promise returned
//! by `play()`. Both reach the page runtime through a [`SignalSink`] held
//! weakly, so a torn-down runtime simply stops receiving signals.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Weak;

use gloo::events::{EventListener, EventListenerOptions};
use js_sys::{Array, Function, Object, Reflect, WeakMap};
use pagefx_core::dropdown::{Key, KeyInput, KeyOutcome, Modifiers};
use pagefx_core::error::{AnimationError, MediaError};
use pagefx_core::{
    Dom, Focus, Layout, LoopHandle, LoopSpec, Media, NodeId, Tracks, TrapHandle, Viewport,
};
use tracing::{trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlElement, HtmlMediaElement, KeyboardEvent, NodeList, Window};

use crate::selectors::FOCUSABLE_SELECTOR;

/// Receiver for signals that arrive after the originating call returned.
pub(crate) trait SignalSink {
    /// A key press routed through the dropdown trap.
    fn trap_key(&self, input: KeyInput) -> KeyOutcome;

    /// The promise returned by `play()` rejected.
    fn play_rejected(&self);
}

/// Map a DOM keyboard event to a pagefx key press.
pub(crate) fn key_input(event: &KeyboardEvent) -> KeyInput {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, event.shift_key());
    modifiers.set(Modifiers::CTRL, event.ctrl_key());
    modifiers.set(Modifiers::ALT, event.alt_key());
    modifiers.set(Modifiers::META, event.meta_key());
    KeyInput::new(Key::from_dom(&event.key())).with_modifiers(modifiers)
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

fn set_js(obj: &Object, key: &str, value: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), value);
}

fn elements(list: &NodeList) -> impl Iterator<Item = Element> + '_ {
    (0..list.length()).filter_map(|i| list.item(i)?.dyn_into::<Element>().ok())
}

/// The live document as a pagefx host.
pub(crate) struct DomPage {
    window: Window,
    document: Document,
    nodes: RefCell<Vec<Option<Element>>>,
    ids: WeakMap,
    pinned: Cell<usize>,
    loops: HashMap<u32, JsValue>,
    next_loop: u32,
    traps: HashMap<u32, EventListener>,
    next_trap: u32,
    sink: Weak<dyn SignalSink>,
}

impl DomPage {
    pub(crate) fn new(window: Window, document: Document, sink: Weak<dyn SignalSink>) -> Self {
        Self {
            window,
            document,
            nodes: RefCell::new(Vec::new()),
            ids: WeakMap::new(),
            pinned: Cell::new(0),
            loops: HashMap::new(),
            next_loop: 0,
            traps: HashMap::new(),
            next_trap: 0,
            sink,
        }
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    // --- Registry ---

    /// Id for an element, registering it on first sight.
    pub(crate) fn register(&self, element: &Element) -> NodeId {
        let key: &Object = element.unchecked_ref();
        if let Some(id) = self.ids.get(key).as_f64() {
            return NodeId::new(id as u32);
        }

        let mut nodes = self.nodes.borrow_mut();
        self.release_detached(&mut nodes);
        let pinned = self.pinned.get();
        let idx = match nodes.iter().skip(pinned).position(Option::is_none) {
            Some(free) => {
                nodes[pinned + free] = Some(element.clone());
                pinned + free
            }
            None => {
                nodes.push(Some(element.clone()));
                nodes.len() - 1
            }
        };
        let id = u32::try_from(idx).unwrap_or(u32::MAX);
        self.ids.set(key, &JsValue::from(id));
        NodeId::new(id)
    }

    /// Keep every element registered so far for the life of the page.
    pub(crate) fn pin(&self) {
        self.pinned.set(self.nodes.borrow().len());
    }

    fn release_detached(&self, nodes: &mut [Option<Element>]) {
        for slot in nodes.iter_mut().skip(self.pinned.get()) {
            if slot.as_ref().is_some_and(|el| !el.is_connected()) {
                if let Some(el) = slot.take() {
                    self.ids.delete(el.unchecked_ref());
                    trace!("released detached node");
                }
            }
        }
    }

    /// Element behind an id.
    pub(crate) fn element(&self, node: NodeId) -> Option<Element> {
        let idx = usize::try_from(node.get()).ok()?;
        self.nodes.borrow().get(idx).cloned().flatten()
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.nodes.borrow().iter().filter(|slot| slot.is_some()).count()
    }

    /// First element matching `selector` in the document.
    pub(crate) fn query(&self, selector: &str) -> Option<NodeId> {
        let element = self.document.query_selector(selector).ok().flatten()?;
        Some(self.register(&element))
    }

    /// Every element matching `selector`, within `root` if given.
    pub(crate) fn query_all(&self, root: Option<NodeId>, selector: &str) -> Vec<NodeId> {
        let list = match root.and_then(|r| self.element(r)) {
            Some(root) => root.query_selector_all(selector),
            None if root.is_some() => return Vec::new(),
            None => self.document.query_selector_all(selector),
        };
        match list {
            Ok(list) => elements(&list).map(|e| self.register(&e)).collect(),
            Err(err) => {
                warn!(selector, error = %describe(&err), "invalid selector");
                Vec::new()
            }
        }
    }

    fn html(&self, node: NodeId) -> Option<HtmlElement> {
        self.element(node)?.dyn_into::<HtmlElement>().ok()
    }

    fn media(&self, node: NodeId) -> Option<HtmlMediaElement> {
        self.element(node)?.dyn_into::<HtmlMediaElement>().ok()
    }
}

impl Layout for DomPage {
    fn viewport(&self) -> Viewport {
        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let root = self.document.document_element();
        Viewport {
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            width: dimension(self.window.inner_width()),
            height: dimension(self.window.inner_height()),
            scroll_height: root.as_ref().map_or(0.0, |r| f64::from(r.scroll_height())),
            client_height: root.as_ref().map_or(0.0, |r| f64::from(r.client_height())),
        }
    }

    fn client_height(&self, node: NodeId) -> f64 {
        self.element(node)
            .map_or(0.0, |e| f64::from(e.client_height()))
    }

    fn scroll_width(&self, node: NodeId) -> f64 {
        self.element(node)
            .map_or(0.0, |e| f64::from(e.scroll_width()))
    }

    fn parent_width(&self, node: NodeId) -> f64 {
        self.element(node)
            .and_then(|e| e.parent_element())
            .map_or(0.0, |p| f64::from(p.client_width()))
    }
}

impl Dom for DomPage {
    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.html(node) {
            let _ = el.style().set_property(property, value);
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.element(node) {
            el.set_text_content(Some(text));
        }
    }

    fn scroll_to_top(&mut self) {
        self.window.scroll_to_with_x_and_y(0.0, 0.0);
    }
}

impl Focus for DomPage {
    fn active_element(&self) -> Option<NodeId> {
        let active = self.document.active_element()?;
        let on_body = self
            .document
            .body()
            .is_some_and(|body| AsRef::<Element>::as_ref(&body) == &active);
        if on_body {
            return None;
        }
        Some(self.register(&active))
    }

    fn focus(&mut self, node: NodeId) {
        if let Some(el) = self.html(node) {
            let _ = el.focus();
        }
    }

    fn focusables_within(&self, container: NodeId) -> Vec<NodeId> {
        self.query_all(Some(container), FOCUSABLE_SELECTOR)
    }

    fn contains(&self, container: NodeId, node: NodeId) -> bool {
        match (self.element(container), self.element(node)) {
            (Some(container), Some(node)) => {
                let node: &web_sys::Node = &node;
                container.contains(Some(node))
            }
            _ => false,
        }
    }

    fn acquire_key_trap(&mut self, container: NodeId) -> TrapHandle {
        self.next_trap += 1;
        let handle = self.next_trap;
        let sink = self.sink.clone();
        let listener = EventListener::new_with_options(
            &self.document,
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let Some(sink) = sink.upgrade() else {
                    return;
                };
                if sink.trap_key(key_input(event)).prevent_default {
                    event.prevent_default();
                }
            },
        );
        self.traps.insert(handle, listener);
        trace!(trap = handle, container = container.get(), "key trap attached");
        TrapHandle::new(handle)
    }

    fn release_key_trap(&mut self, handle: TrapHandle) {
        // Dropping the listener detaches it.
        if self.traps.remove(&handle.get()).is_some() {
            trace!(trap = handle.get(), "key trap released");
        }
    }
}

impl Media for DomPage {
    fn play(&mut self, video: NodeId) -> Result<(), MediaError> {
        let Some(media) = self.media(video) else {
            return Ok(());
        };
        let promise = media
            .play()
            .map_err(|err| MediaError::PlaybackDenied(describe(&err)))?;
        let sink = self.sink.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                warn!(error = %describe(&err), "hero video play() rejected");
                if let Some(sink) = sink.upgrade() {
                    sink.play_rejected();
                }
            }
        });
        Ok(())
    }

    fn pause(&mut self, video: NodeId) -> Result<(), MediaError> {
        match self.media(video) {
            Some(media) => media
                .pause()
                .map_err(|err| MediaError::ControlFailed(describe(&err))),
            None => Ok(()),
        }
    }

    fn seek_to_start(&mut self, video: NodeId) -> Result<(), MediaError> {
        if let Some(media) = self.media(video) {
            media.set_current_time(0.0);
        }
        Ok(())
    }
}

impl Tracks for DomPage {
    fn child_markup(&self, track: NodeId) -> Vec<String> {
        let Some(el) = self.element(track) else {
            return Vec::new();
        };
        let children = el.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(|child| child.outer_html())
            .collect()
    }

    fn replace_children(&mut self, track: NodeId, markup: &[String]) {
        if let Some(el) = self.element(track) {
            el.set_inner_html(&markup.concat());
        }
    }

    fn append_children(&mut self, track: NodeId, markup: &[String]) {
        if let Some(el) = self.element(track) {
            if let Err(err) = el.insert_adjacent_html("beforeend", &markup.concat()) {
                warn!(error = %describe(&err), "ticker append failed");
            }
        }
    }

    fn start_loop(&mut self, track: NodeId, spec: LoopSpec) -> Result<LoopHandle, AnimationError> {
        let el = self.element(track).ok_or(AnimationError::Unsupported)?;
        let animate = Reflect::get(&el, &JsValue::from_str("animate"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or(AnimationError::Unsupported)?;

        let from = Object::new();
        set_js(&from, "transform", &JsValue::from_str("translateX(0)"));
        let to = Object::new();
        set_js(
            &to,
            "transform",
            &JsValue::from_str(&format!("translateX(-{}px)", spec.distance_px)),
        );
        let keyframes = Array::of2(&from, &to);

        let timing = Object::new();
        set_js(&timing, "duration", &JsValue::from_f64(spec.duration.as_secs_f64() * 1000.0));
        set_js(&timing, "iterations", &JsValue::from_f64(f64::INFINITY));
        set_js(&timing, "easing", &JsValue::from_str("linear"));

        let animation = animate
            .call2(&el, &keyframes, &timing)
            .map_err(|err| AnimationError::Rejected(describe(&err)))?;
        self.next_loop += 1;
        self.loops.insert(self.next_loop, animation);
        Ok(LoopHandle::new(self.next_loop))
    }

    fn cancel_loop(&mut self, handle: LoopHandle) {
        let Some(animation) = self.loops.remove(&handle.get()) else {
            return;
        };
        if let Some(cancel) = Reflect::get(&animation, &JsValue::from_str("cancel"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
        {
            let _ = cancel.call0(&animation);
        }
    }
}
