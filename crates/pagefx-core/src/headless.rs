#![forbid(unsafe_code)]

//! In-memory page host.
//!
//! [`HeadlessPage`] implements every host trait against plain maps, so the
//! whole controller can run without a browser: in unit and property tests,
//! and for server-side simulation of the page's initial visual state.
//!
//! Geometry is scripted: the caller sets the viewport, element heights,
//! parent widths, and the width of each child markup string. A track's
//! `scrollWidth` is the sum of its children's widths.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AnimationError, MediaError};
use crate::geometry::{Layout, NodeId, Viewport};
use crate::host::{Dom, Focus, LoopHandle, LoopSpec, Media, TrapHandle, Tracks};

/// One recorded media call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCall {
    Play(NodeId),
    Pause(NodeId),
    SeekToStart(NodeId),
}

/// Scriptable in-memory page.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPage {
    viewport: Viewport,
    heights: BTreeMap<NodeId, f64>,
    parent_widths: BTreeMap<NodeId, f64>,

    classes: BTreeMap<NodeId, BTreeSet<String>>,
    styles: BTreeMap<(NodeId, String), String>,
    attributes: BTreeMap<(NodeId, String), String>,
    text: BTreeMap<NodeId, String>,
    scroll_resets: u32,

    parents: BTreeMap<NodeId, NodeId>,
    tab_order: Vec<NodeId>,
    active: Option<NodeId>,
    traps: BTreeMap<u32, NodeId>,
    next_trap: u32,

    media_calls: Vec<MediaCall>,
    deny_play: bool,
    fail_seek: bool,

    children: BTreeMap<NodeId, Vec<String>>,
    markup_widths: BTreeMap<String, f64>,
    default_child_width: f64,
    loops: BTreeMap<u32, (NodeId, LoopSpec)>,
    next_loop: u32,
    animations_unsupported: bool,
    append_calls: u32,
}

impl HeadlessPage {
    /// Create a page with the given viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    // --- Scripting ---

    /// Update the scroll offset.
    pub fn set_scroll_y(&mut self, scroll_y: f64) {
        self.viewport.scroll_y = scroll_y;
    }

    /// Update the viewport width.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport.width = width;
    }

    /// Replace the whole viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Set an element's rendered height.
    pub fn set_height(&mut self, node: NodeId, height: f64) {
        self.heights.insert(node, height);
    }

    /// Set the width of a track's parent.
    pub fn set_parent_width(&mut self, track: NodeId, width: f64) {
        self.parent_widths.insert(track, width);
    }

    /// Set a track's children.
    pub fn set_children<S: AsRef<str>>(&mut self, track: NodeId, markup: &[S]) {
        self.children.insert(
            track,
            markup.iter().map(|m| m.as_ref().to_string()).collect(),
        );
    }

    /// Set the rendered width of a specific child markup string.
    pub fn set_markup_width(&mut self, markup: &str, width: f64) {
        self.markup_widths.insert(markup.to_string(), width);
    }

    /// Width used for child markup without an explicit width.
    pub fn set_default_child_width(&mut self, width: f64) {
        self.default_child_width = width;
    }

    /// Place `child` inside `parent` for containment queries.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) {
        self.parents.insert(child, parent);
    }

    /// Append an element to the document tab order.
    pub fn push_focusable(&mut self, node: NodeId) {
        self.tab_order.push(node);
    }

    /// Force the focused element (`None` = focus lost).
    pub fn set_active(&mut self, node: Option<NodeId>) {
        self.active = node;
    }

    /// Move focus the way an unhandled Tab (or Shift+Tab) would: to the
    /// next (or previous) element in the document tab order. Focus falls
    /// off either end to `None`.
    pub fn advance_focus(&mut self, backwards: bool) {
        let position = self
            .active
            .and_then(|a| self.tab_order.iter().position(|&n| n == a));
        let next = match (position, backwards) {
            (None, false) => Some(0),
            (None, true) => self.tab_order.len().checked_sub(1),
            (Some(i), false) => Some(i + 1),
            (Some(i), true) => i.checked_sub(1),
        };
        self.active = next.and_then(|i| self.tab_order.get(i).copied());
    }

    /// Make every `play` call fail synchronously.
    pub fn deny_playback(&mut self, deny: bool) {
        self.deny_play = deny;
    }

    /// Make every seek fail.
    pub fn fail_seeks(&mut self, fail: bool) {
        self.fail_seek = fail;
    }

    /// Make scripted animation creation fail.
    pub fn disable_animations(&mut self, disabled: bool) {
        self.animations_unsupported = disabled;
    }

    // --- Inspection ---

    /// Classes currently on an element, sorted.
    #[must_use]
    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.classes
            .get(&node)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Inline style value.
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.styles
            .get(&(node, property.to_string()))
            .map(String::as_str)
    }

    /// Attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes
            .get(&(node, name.to_string()))
            .map(String::as_str)
    }

    /// Text content.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.text.get(&node).map(String::as_str)
    }

    /// Number of `scroll_to_top` calls.
    #[must_use]
    pub const fn scroll_resets(&self) -> u32 {
        self.scroll_resets
    }

    /// Every media call made so far.
    #[must_use]
    pub fn media_calls(&self) -> &[MediaCall] {
        &self.media_calls
    }

    /// Number of keyboard traps currently held.
    #[must_use]
    pub fn active_traps(&self) -> usize {
        self.traps.len()
    }

    /// Running loop animations as `(track, spec)`.
    #[must_use]
    pub fn active_loops(&self) -> Vec<(NodeId, LoopSpec)> {
        self.loops.values().copied().collect()
    }

    /// Current children of a track.
    #[must_use]
    pub fn children(&self, track: NodeId) -> &[String] {
        self.children.get(&track).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of `append_children` calls.
    #[must_use]
    pub const fn append_calls(&self) -> u32 {
        self.append_calls
    }

    fn markup_width(&self, markup: &str) -> f64 {
        self.markup_widths
            .get(markup)
            .copied()
            .unwrap_or(self.default_child_width)
    }
}

impl Layout for HeadlessPage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn client_height(&self, node: NodeId) -> f64 {
        self.heights.get(&node).copied().unwrap_or(0.0)
    }

    fn scroll_width(&self, node: NodeId) -> f64 {
        self.children
            .get(&node)
            .map(|kids| kids.iter().map(|m| self.markup_width(m)).sum())
            .unwrap_or(0.0)
    }

    fn parent_width(&self, node: NodeId) -> f64 {
        self.parent_widths.get(&node).copied().unwrap_or(0.0)
    }
}

impl Dom for HeadlessPage {
    fn add_class(&mut self, node: NodeId, class: &str) {
        self.classes
            .entry(node)
            .or_default()
            .insert(class.to_string());
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(set) = self.classes.get_mut(&node) {
            set.remove(class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes
            .get(&node)
            .is_some_and(|set| set.contains(class))
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        self.styles
            .insert((node, property.to_string()), value.to_string());
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.attributes
            .insert((node, name.to_string()), value.to_string());
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.text.insert(node, text.to_string());
    }

    fn scroll_to_top(&mut self) {
        self.scroll_resets += 1;
        self.viewport.scroll_y = 0.0;
    }
}

impl Focus for HeadlessPage {
    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn focus(&mut self, node: NodeId) {
        self.active = Some(node);
    }

    fn focusables_within(&self, container: NodeId) -> Vec<NodeId> {
        self.tab_order
            .iter()
            .copied()
            .filter(|&n| n != container && self.contains(container, n))
            .collect()
    }

    fn contains(&self, container: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        // Parent chains are acyclic in a real document; bound the walk anyway.
        let mut hops = 0usize;
        while let Some(n) = cursor {
            if n == container {
                return true;
            }
            hops += 1;
            if hops > self.parents.len() {
                return false;
            }
            cursor = self.parents.get(&n).copied();
        }
        false
    }

    fn acquire_key_trap(&mut self, container: NodeId) -> TrapHandle {
        self.next_trap += 1;
        self.traps.insert(self.next_trap, container);
        TrapHandle::new(self.next_trap)
    }

    fn release_key_trap(&mut self, handle: TrapHandle) {
        self.traps.remove(&handle.get());
    }
}

impl Media for HeadlessPage {
    fn play(&mut self, video: NodeId) -> Result<(), MediaError> {
        self.media_calls.push(MediaCall::Play(video));
        if self.deny_play {
            return Err(MediaError::PlaybackDenied("NotAllowedError".into()));
        }
        Ok(())
    }

    fn pause(&mut self, video: NodeId) -> Result<(), MediaError> {
        self.media_calls.push(MediaCall::Pause(video));
        Ok(())
    }

    fn seek_to_start(&mut self, video: NodeId) -> Result<(), MediaError> {
        self.media_calls.push(MediaCall::SeekToStart(video));
        if self.fail_seek {
            return Err(MediaError::ControlFailed("InvalidStateError".into()));
        }
        Ok(())
    }
}

impl Tracks for HeadlessPage {
    fn child_markup(&self, track: NodeId) -> Vec<String> {
        self.children.get(&track).cloned().unwrap_or_default()
    }

    fn replace_children(&mut self, track: NodeId, markup: &[String]) {
        self.children.insert(track, markup.to_vec());
    }

    fn append_children(&mut self, track: NodeId, markup: &[String]) {
        self.append_calls += 1;
        self.children
            .entry(track)
            .or_default()
            .extend(markup.iter().cloned());
    }

    fn start_loop(&mut self, track: NodeId, spec: LoopSpec) -> Result<LoopHandle, AnimationError> {
        if self.animations_unsupported {
            return Err(AnimationError::Unsupported);
        }
        self.next_loop += 1;
        self.loops.insert(self.next_loop, (track, spec));
        Ok(LoopHandle::new(self.next_loop))
    }

    fn cancel_loop(&mut self, handle: LoopHandle) {
        self.loops.remove(&handle.get());
    }
}
