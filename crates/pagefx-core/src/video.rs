#![forbid(unsafe_code)]

//! Hero video lifecycle: autoplay, freeze on the last frame, scroll-gated
//! replay.
//!
//! # Invariants
//!
//! 1. `Completed` is entered only from the `ended` signal.
//! 2. `Completed` is left only through the replay gate, which moves to `Idle`.
//! 3. Replay needs both gates: the video is `Completed` *and* the reader has
//!    scrolled at least one viewport height since the last replay. Replay
//!    clears the scroll gate, so every replay needs a fresh trip down the page.
//! 4. At most one autoplay retry is armed at a time.
//!
//! # Failure Modes
//!
//! - No video element: every operation is a no-op.
//! - `play`/`seek` failure: swallowed and logged; the last frame stays up.

use tracing::{debug, trace, warn};

use crate::config::VideoConfig;
use crate::geometry::{NodeId, Viewport};
use crate::host::{Dom, Media};

/// Class that fades the video in.
pub const VISIBLE_CLASS: &str = "play-visible";
/// Class that fades the video out.
pub const HIDDEN_CLASS: &str = "play-hidden";

/// Playback state owned by [`VideoLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoState {
    /// Not playing and not finished (startup, or re-armed after replay).
    #[default]
    Idle,
    /// The platform reported `playing`.
    Playing,
    /// The platform reported `ended`; frozen on the last frame.
    Completed,
}

/// Hero video state machine.
#[derive(Debug, Clone)]
pub struct VideoLifecycle {
    video: Option<NodeId>,
    state: VideoState,
    scrolled_one_viewport: bool,
    retry_armed: bool,
    replay_top_px: f64,
}

impl VideoLifecycle {
    /// Create the lifecycle for an optional video element.
    #[must_use]
    pub fn new(video: Option<NodeId>, config: &VideoConfig) -> Self {
        Self {
            video,
            state: VideoState::Idle,
            scrolled_one_viewport: false,
            retry_armed: false,
            replay_top_px: config.replay_top_px,
        }
    }

    /// The video element, if the page has one.
    #[must_use]
    pub const fn video(&self) -> Option<NodeId> {
        self.video
    }

    /// Current playback state.
    #[must_use]
    pub const fn state(&self) -> VideoState {
        self.state
    }

    /// Whether a full viewport of scrolling was observed since the last
    /// replay.
    #[must_use]
    pub const fn has_scrolled_one_viewport(&self) -> bool {
        self.scrolled_one_viewport
    }

    /// Whether a gesture-triggered retry is waiting.
    #[must_use]
    pub const fn retry_armed(&self) -> bool {
        self.retry_armed
    }

    /// Start playback once at startup.
    ///
    /// A synchronous failure arms the gesture retry immediately; an
    /// asynchronous rejection arrives later via [`Self::on_play_rejected`].
    pub fn attempt_autoplay<M: Media>(&mut self, media: &mut M) {
        let Some(video) = self.video else {
            return;
        };
        if let Err(err) = media.play(video) {
            warn!(error = %err, "hero video autoplay failed");
            self.on_play_rejected();
        }
    }

    /// The platform rejected a play request.
    ///
    /// Returns `true` when this call armed the retry, so the host knows to
    /// start listening for the first click or key-down.
    pub fn on_play_rejected(&mut self) -> bool {
        if self.video.is_none() || self.retry_armed {
            return false;
        }
        debug!("autoplay blocked, retry armed for first user gesture");
        self.retry_armed = true;
        true
    }

    /// A click or key-down happened anywhere in the document.
    ///
    /// Returns `true` when the armed retry was consumed.
    pub fn on_user_gesture<M: Media>(&mut self, media: &mut M) -> bool {
        if !self.retry_armed {
            return false;
        }
        self.retry_armed = false;
        if let Some(video) = self.video {
            debug!("retrying hero video playback after user gesture");
            if let Err(err) = media.play(video) {
                warn!(error = %err, "hero video retry failed");
            }
        }
        true
    }

    /// The platform reported `playing`.
    pub fn on_playing<D: Dom>(&mut self, dom: &mut D) {
        let Some(video) = self.video else {
            return;
        };
        show(dom, video);
        if self.state == VideoState::Idle {
            debug!("hero video playing");
            self.state = VideoState::Playing;
        }
    }

    /// The platform reported `ended`.
    pub fn on_ended<H: Dom + Media>(&mut self, host: &mut H) {
        let Some(video) = self.video else {
            return;
        };
        if let Err(err) = host.pause(video) {
            warn!(error = %err, "pausing finished hero video failed");
        }
        self.state = VideoState::Completed;
        show(host, video);
        debug!("hero video completed, holding last frame");
    }

    /// Evaluate the replay gate for one scroll tick.
    ///
    /// Returns `true` when a replay was started.
    pub fn on_scroll<H: Dom + Media>(&mut self, host: &mut H, viewport: &Viewport) -> bool {
        let Some(video) = self.video else {
            return false;
        };
        if viewport.scroll_y >= viewport.height && !self.scrolled_one_viewport {
            trace!(scroll_y = viewport.scroll_y, "replay gate: viewport scrolled");
            self.scrolled_one_viewport = true;
        }
        let near_top = viewport.scroll_y < self.replay_top_px;
        if !(near_top && self.state == VideoState::Completed && self.scrolled_one_viewport) {
            return false;
        }

        if let Err(err) = host.seek_to_start(video) {
            warn!(error = %err, "rewinding hero video failed");
        }
        show(host, video);
        if let Err(err) = host.play(video) {
            warn!(error = %err, "replaying hero video failed");
        }
        self.state = VideoState::Idle;
        self.scrolled_one_viewport = false;
        debug!("hero video replayed near top of page");
        true
    }
}

fn show<D: Dom>(dom: &mut D, video: NodeId) {
    dom.add_class(video, VISIBLE_CLASS);
    dom.remove_class(video, HIDDEN_CLASS);
}
