#![forbid(unsafe_code)]

//! Host traits: the boundary between pagefx components and the page.
//!
//! Components never touch a platform API directly. The browser adapter
//! (`pagefx-web`) implements these traits on `web-sys`; the
//! [`HeadlessPage`](crate::headless::HeadlessPage) implements them in memory
//! for tests and server-side simulation.
//!
//! Mutation methods are infallible: writing a class or style to the page
//! cannot fail in a way a component could recover from. Capabilities that
//! the platform may deny (playback, scripted animation, storage) return
//! `Result` so the component can pick its degraded path.

use core::time::Duration;

use crate::error::{AnimationError, MediaError, StorageError};
use crate::geometry::{Layout, NodeId};

/// Class, style, and attribute mutation.
pub trait Dom {
    /// Add a class to an element's class list.
    fn add_class(&mut self, node: NodeId, class: &str);

    /// Remove a class from an element's class list.
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Whether the element currently carries the class.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Set an inline style property (including custom properties).
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    /// Set an attribute value.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Replace the element's text content.
    fn set_text(&mut self, node: NodeId, text: &str);

    /// Scroll the document to the top without animation.
    fn scroll_to_top(&mut self);

    /// Add or remove a class depending on `on`.
    fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }
}

/// Handle to an acquired keyboard trap listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrapHandle(u32);

impl TrapHandle {
    /// Wrap a raw host handle.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw host handle.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Keyboard focus queries and the keydown trap resource.
pub trait Focus {
    /// Element that currently has focus, or `None` when focus is lost
    /// (on the document body or outside the page).
    fn active_element(&self) -> Option<NodeId>;

    /// Move focus to an element.
    fn focus(&mut self, node: NodeId);

    /// Focusable descendants of `container`, in tab order.
    fn focusables_within(&self, container: NodeId) -> Vec<NodeId>;

    /// Whether `node` is `container` or one of its descendants.
    fn contains(&self, container: NodeId, node: NodeId) -> bool;

    /// Attach a keydown listener that routes key presses to the trap.
    ///
    /// The host must keep the listener alive until [`Focus::release_key_trap`].
    fn acquire_key_trap(&mut self, container: NodeId) -> TrapHandle;

    /// Detach a listener previously returned by [`Focus::acquire_key_trap`].
    fn release_key_trap(&mut self, handle: TrapHandle);
}

/// Video element control.
///
/// `play` only reports synchronous failures. An asynchronous rejection
/// (autoplay policy) is delivered later by the host as a separate event.
pub trait Media {
    /// Request playback.
    fn play(&mut self, video: NodeId) -> Result<(), MediaError>;

    /// Pause, keeping the current frame on screen.
    fn pause(&mut self, video: NodeId) -> Result<(), MediaError>;

    /// Reset the playback position to the start.
    fn seek_to_start(&mut self, video: NodeId) -> Result<(), MediaError>;
}

/// Owning handle to a running loop animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle(u32);

impl LoopHandle {
    /// Wrap a raw host handle.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw host handle.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Parameters of an infinite linear translate loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSpec {
    /// Translate from `0` to `-distance_px` along the x axis.
    pub distance_px: u32,
    /// Duration of one full cycle.
    pub duration: Duration,
}

/// Marquee track content and loop animation control.
///
/// Content is exchanged as serialized markup of the track's direct children
/// (`outerHTML`), so canonical content can be compared and restored exactly.
pub trait Tracks {
    /// Serialized markup of each direct child, in order.
    fn child_markup(&self, track: NodeId) -> Vec<String>;

    /// Replace all children with the given markup.
    fn replace_children(&mut self, track: NodeId, markup: &[String]);

    /// Append children built from the given markup.
    fn append_children(&mut self, track: NodeId, markup: &[String]);

    /// Start an infinite loop animation on the track.
    fn start_loop(&mut self, track: NodeId, spec: LoopSpec) -> Result<LoopHandle, AnimationError>;

    /// Cancel a running loop. Unknown handles are ignored.
    fn cancel_loop(&mut self, handle: LoopHandle);
}

/// Client-local key-value storage for the single persisted preference.
pub trait PreferenceStore {
    /// Read a value. `Ok(None)` when the key is absent.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Monotonic clock abstraction.
///
/// Debounce deadlines and slogan intervals are expressed against this
/// clock, so tests can advance time explicitly.
pub trait Clock {
    /// Elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// Wall clock backed by `web_time::Instant` (`performance.now()` on wasm).
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: web_time::Instant,
}

impl WallClock {
    /// Start a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Everything a page host provides to the orchestrator.
pub trait Host: Layout + Dom + Focus + Media + Tracks {}

impl<T: Layout + Dom + Focus + Media + Tracks> Host for T {}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[derive(Default)]
    struct ClassOnly {
        classes: BTreeSet<(u32, String)>,
    }

    impl Dom for ClassOnly {
        fn add_class(&mut self, node: NodeId, class: &str) {
            self.classes.insert((node.get(), class.to_string()));
        }

        fn remove_class(&mut self, node: NodeId, class: &str) {
            self.classes.remove(&(node.get(), class.to_string()));
        }

        fn has_class(&self, node: NodeId, class: &str) -> bool {
            self.classes.contains(&(node.get(), class.to_string()))
        }

        fn set_style(&mut self, _node: NodeId, _property: &str, _value: &str) {}

        fn set_attribute(&mut self, _node: NodeId, _name: &str, _value: &str) {}

        fn set_text(&mut self, _node: NodeId, _text: &str) {}

        fn scroll_to_top(&mut self) {}
    }

    #[test]
    fn set_class_adds_and_removes() {
        let mut dom = ClassOnly::default();
        let node = NodeId::new(7);
        dom.set_class(node, "solid", true);
        assert!(dom.has_class(node, "solid"));
        dom.set_class(node, "solid", false);
        assert!(!dom.has_class(node, "solid"));
    }

    #[test]
    fn wall_clock_is_monotonic() {
        let clock = WallClock::new();
        let a = clock.now_mono();
        let b = clock.now_mono();
        assert!(b >= a);
    }

    #[test]
    fn handles_round_trip() {
        assert_eq!(LoopHandle::new(3).get(), 3);
        assert_eq!(TrapHandle::new(9).get(), 9);
    }
}
