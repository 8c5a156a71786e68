#![forbid(unsafe_code)]

//! pagefx error model and graceful degradation.
//!
//! # Design Principles
//!
//! 1. **Nothing is fatal**: every error maps to a [`Degradation`] that
//!    leaves the page static but usable.
//! 2. **Domain-specific errors**: each host capability has its own typed
//!    error so adapters can report what actually failed.
//! 3. **Absorbed at the component boundary**: components log and degrade;
//!    they never hand an error back to an event handler.

use std::fmt;

// ── Domain-Specific Error Types ─────────────────────────────────────────

/// Client-local storage errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No storage backend is available (private mode, sandboxed frame).
    Unavailable,
    /// The backend refused the operation (quota, security policy).
    Denied(String),
}

/// Loop animation creation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// The platform has no scripted animation support.
    Unsupported,
    /// The platform rejected the keyframes or timing.
    Rejected(String),
}

/// Media element errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The platform refused to start playback (autoplay policy).
    PlaybackDenied(String),
    /// Seeking or pausing threw synchronously.
    ControlFailed(String),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be parsed.
    Parse(String),
    /// A value parsed but is outside its valid range.
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for pagefx.
///
/// Use [`Error::degradation`] to find the recovery path for a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Storage read or write failure.
    Storage(StorageError),
    /// Loop animation could not be created.
    Animation(AnimationError),
    /// Video control failure.
    Media(MediaError),
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// An expected element is absent from the page.
    MissingElement(&'static str),
}

/// Standard result type for pagefx APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Graceful Degradation ────────────────────────────────────────────────

/// What a component does instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Retry on the next user gesture (click or key-down).
    RetryOnGesture,
    /// Fall back to a CSS-driven hint instead of a scripted animation.
    CssFallback,
    /// Use the built-in default value.
    UseDefault,
    /// Disable only the affected component.
    SelfDisable,
    /// Keep the current visual state (e.g. the last video frame).
    KeepLastFrame,
}

impl Error {
    /// Determine the graceful degradation action for this error.
    pub fn degradation(&self) -> Degradation {
        match self {
            Self::Storage(_) => Degradation::UseDefault,
            Self::Animation(_) => Degradation::CssFallback,
            Self::Media(MediaError::PlaybackDenied(_)) => Degradation::RetryOnGesture,
            Self::Media(MediaError::ControlFailed(_)) => Degradation::KeepLastFrame,
            Self::Config(_) => Degradation::UseDefault,
            Self::MissingElement(_) => Degradation::SelfDisable,
        }
    }

    /// Error type label for tracing fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Animation(_) => "animation",
            Self::Media(_) => "media",
            Self::Config(_) => "config",
            Self::MissingElement(_) => "missing_element",
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage unavailable"),
            Self::Denied(msg) => write!(f, "storage denied: {msg}"),
        }
    }
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "scripted animation unsupported"),
            Self::Rejected(msg) => write!(f, "animation rejected: {msg}"),
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaybackDenied(msg) => write!(f, "playback denied: {msg}"),
            Self::ControlFailed(msg) => write!(f, "media control failed: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse: {msg}"),
            Self::Invalid { field, reason } => write!(f, "config field '{field}' {reason}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Animation(err) => write!(f, "{err}"),
            Self::Media(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::MissingElement(role) => write!(f, "missing element: {role}"),
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryOnGesture => write!(f, "retry_on_gesture"),
            Self::CssFallback => write!(f, "css_fallback"),
            Self::UseDefault => write!(f, "use_default"),
            Self::SelfDisable => write!(f, "self_disable"),
            Self::KeepLastFrame => write!(f, "keep_last_frame"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────────

impl std::error::Error for StorageError {}
impl std::error::Error for AnimationError {}
impl std::error::Error for MediaError {}
impl std::error::Error for ConfigError {}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Animation(err) => Some(err),
            Self::Media(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::MissingElement(_) => None,
        }
    }
}

// ── From conversions ────────────────────────────────────────────────────

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<AnimationError> for Error {
    fn from(err: AnimationError) -> Self {
        Self::Animation(err)
    }
}

impl From<MediaError> for Error {
    fn from(err: MediaError) -> Self {
        Self::Media(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
