#![forbid(unsafe_code)]

//! Focus-trapped dropdown with a responsive accordion mode.
//!
//! # State Machine
//!
//! ```text
//!            toggle click
//!   Closed ───────────────▶ Open
//!     ▲                      │
//!     └──────────────────────┘
//!     toggle click | outside click | Escape
//! ```
//!
//! # Invariants
//!
//! 1. **Trap ownership**: `Open` holds exactly one keyboard trap; `Closed`
//!    holds none. Every path into `Closed` releases the trap first.
//! 2. **Auto-focus**: entering `Open` focuses the first focusable descendant
//!    of the panel (if any).
//! 3. **Wrap**: while open, Tab on the last focusable goes to the first and
//!    Shift+Tab on the first goes to the last. Focus that is outside the set
//!    is pulled back in.
//! 4. **Restoration without theft**: closing returns focus to the toggle
//!    only when focus is inside the panel or lost. A close caused by clicking
//!    elsewhere leaves focus on whatever was clicked.
//!
//! # Accordion Mode
//!
//! Below the width breakpoint each item toggles its own `expanded` flag on
//! click, Enter, or Space, independently of the others. Above it every
//! item's expansion is cleared.

use bitflags::bitflags;
use tracing::{debug, trace};

use crate::config::DropdownConfig;
use crate::geometry::NodeId;
use crate::host::{Dom, Focus, TrapHandle};

/// Class on the panel while open.
pub const OPEN_CLASS: &str = "open";
/// Class on an expanded accordion item.
pub const EXPANDED_CLASS: &str = "expanded";

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Keys the page reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Escape,
    Enter,
    Space,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            " " | "Spacebar" => Self::Space,
            _ => Self::Other,
        }
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// What the host should do with the originating event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    pub prevent_default: bool,
}

impl KeyOutcome {
    pub const HANDLED: Self = Self {
        prevent_default: true,
    };
    pub const IGNORED: Self = Self {
        prevent_default: false,
    };
}

/// Dropdown open/close state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropdownState {
    #[default]
    Closed,
    Open,
}

/// Elements making up one dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownParts {
    pub toggle: NodeId,
    pub panel: NodeId,
    /// Items that expand independently in accordion mode.
    pub items: Vec<NodeId>,
}

/// Dropdown controller.
#[derive(Debug, Clone)]
pub struct DropdownController {
    parts: DropdownParts,
    state: DropdownState,
    trap: Option<TrapHandle>,
    previously_focused: Option<NodeId>,
    accordion: bool,
    expanded: Vec<bool>,
    breakpoint_px: f64,
}

impl DropdownController {
    #[must_use]
    pub fn new(parts: DropdownParts, config: &DropdownConfig) -> Self {
        let expanded = vec![false; parts.items.len()];
        Self {
            parts,
            state: DropdownState::Closed,
            trap: None,
            previously_focused: None,
            accordion: false,
            expanded,
            breakpoint_px: config.accordion_breakpoint_px,
        }
    }

    /// Write the initial closed state and responsive mode.
    pub fn init<D: Dom>(&mut self, dom: &mut D, viewport_width: f64) {
        dom.remove_class(self.parts.panel, OPEN_CLASS);
        dom.set_attribute(self.parts.toggle, "aria-expanded", "false");
        self.on_resize(dom, viewport_width);
    }

    #[must_use]
    pub const fn state(&self) -> DropdownState {
        self.state
    }

    #[must_use]
    pub const fn parts(&self) -> &DropdownParts {
        &self.parts
    }

    /// Whether a keyboard trap is currently held.
    #[must_use]
    pub const fn holds_trap(&self) -> bool {
        self.trap.is_some()
    }

    /// Element that had focus when the dropdown opened.
    #[must_use]
    pub const fn previously_focused(&self) -> Option<NodeId> {
        self.previously_focused
    }

    #[must_use]
    pub const fn is_accordion(&self) -> bool {
        self.accordion
    }

    /// Whether an accordion item is expanded.
    #[must_use]
    pub fn is_expanded(&self, item: NodeId) -> bool {
        self.item_index(item)
            .is_some_and(|idx| self.expanded[idx])
    }

    /// Flip between open and closed.
    pub fn toggle<H: Dom + Focus>(&mut self, host: &mut H) {
        match self.state {
            DropdownState::Closed => self.open(host),
            DropdownState::Open => self.close(host),
        }
    }

    /// Enter `Open`: acquire the trap and focus the first item.
    pub fn open<H: Dom + Focus>(&mut self, host: &mut H) {
        if self.state == DropdownState::Open {
            return;
        }
        self.state = DropdownState::Open;
        self.previously_focused = host.active_element();
        host.add_class(self.parts.panel, OPEN_CLASS);
        host.set_attribute(self.parts.toggle, "aria-expanded", "true");
        self.trap = Some(host.acquire_key_trap(self.parts.panel));
        if let Some(&first) = host.focusables_within(self.parts.panel).first() {
            host.focus(first);
        }
        debug!("dropdown opened");
    }

    /// Enter `Closed`: release the trap and restore focus if it was inside.
    pub fn close<H: Dom + Focus>(&mut self, host: &mut H) {
        if self.state == DropdownState::Closed {
            return;
        }
        if let Some(trap) = self.trap.take() {
            host.release_key_trap(trap);
        }
        self.state = DropdownState::Closed;
        host.remove_class(self.parts.panel, OPEN_CLASS);
        host.set_attribute(self.parts.toggle, "aria-expanded", "false");

        let restore = match host.active_element() {
            None => true,
            Some(active) => host.contains(self.parts.panel, active),
        };
        if restore {
            host.focus(self.parts.toggle);
        }
        self.previously_focused = None;
        debug!(restored_focus = restore, "dropdown closed");
    }

    /// A click landed on `target`. Returns `true` if the state changed.
    pub fn on_document_click<H: Dom + Focus>(&mut self, host: &mut H, target: NodeId) -> bool {
        let before = self.state;
        if host.contains(self.parts.toggle, target) {
            self.toggle(host);
        } else if self.state == DropdownState::Open && !host.contains(self.parts.panel, target) {
            self.close(host);
        }
        self.state != before
    }

    /// Escape forces `Closed`. Returns `true` if the dropdown was open.
    pub fn on_escape<H: Dom + Focus>(&mut self, host: &mut H) -> bool {
        if self.state == DropdownState::Closed {
            return false;
        }
        self.close(host);
        true
    }

    /// Key press routed through the held trap.
    pub fn on_trap_key<H: Focus>(&mut self, host: &mut H, input: KeyInput) -> KeyOutcome {
        if self.trap.is_none() || input.key != Key::Tab {
            return KeyOutcome::IGNORED;
        }
        let set = host.focusables_within(self.parts.panel);
        let (Some(&first), Some(&last)) = (set.first(), set.last()) else {
            // Nothing focusable inside: keep focus where it is.
            return KeyOutcome::HANDLED;
        };
        let active = host.active_element();
        let inside = active.is_some_and(|a| set.contains(&a));

        let wrap_to = if input.shift() {
            (!inside || active == Some(first)).then_some(last)
        } else {
            (!inside || active == Some(last)).then_some(first)
        };
        match wrap_to {
            Some(node) => {
                trace!(to = node.get(), "focus trap wrapped");
                host.focus(node);
                KeyOutcome::HANDLED
            }
            None => KeyOutcome::IGNORED,
        }
    }

    /// Recompute the responsive mode for a new viewport width.
    pub fn on_resize<D: Dom>(&mut self, dom: &mut D, viewport_width: f64) {
        let accordion = viewport_width < self.breakpoint_px;
        if accordion != self.accordion {
            debug!(accordion, "dropdown responsive mode changed");
        }
        self.accordion = accordion;
        if !accordion {
            for (idx, &item) in self.parts.items.iter().enumerate() {
                self.expanded[idx] = false;
                dom.remove_class(item, EXPANDED_CLASS);
                dom.set_attribute(item, "aria-expanded", "false");
            }
        }
    }

    /// Click on an accordion item. Returns `true` if it toggled.
    pub fn on_item_activate<D: Dom>(&mut self, dom: &mut D, item: NodeId) -> bool {
        if !self.accordion {
            return false;
        }
        let Some(idx) = self.item_index(item) else {
            return false;
        };
        let expanded = !self.expanded[idx];
        self.expanded[idx] = expanded;
        dom.set_class(item, EXPANDED_CLASS, expanded);
        dom.set_attribute(item, "aria-expanded", if expanded { "true" } else { "false" });
        true
    }

    /// Key press on an accordion item: Enter and Space toggle it.
    pub fn on_item_key<D: Dom>(&mut self, dom: &mut D, item: NodeId, input: KeyInput) -> KeyOutcome {
        match input.key {
            Key::Enter | Key::Space if self.on_item_activate(dom, item) => KeyOutcome::HANDLED,
            _ => KeyOutcome::IGNORED,
        }
    }

    fn item_index(&self, item: NodeId) -> Option<usize> {
        self.parts.items.iter().position(|&i| i == item)
    }
}
