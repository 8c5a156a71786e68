#![forbid(unsafe_code)]

//! The single persisted preference: which implementation variant to show.
//!
//! Reads happen once at startup and writes on every toggle. Storage is
//! best-effort: a missing key, an unknown value, or a failing backend all
//! resolve to [`Variant::A`], and a failed write only costs persistence.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::host::PreferenceStore;

/// Implementation variant shown in the page's callouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    A,
    B,
}

impl Variant {
    /// Parse a stored or `data-variant` value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }

    /// Stored form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// Read the preference, defaulting to [`Variant::A`] on any problem.
    pub fn load<S: PreferenceStore + ?Sized>(store: &S, key: &str) -> Self {
        match store.load(key) {
            Ok(Some(raw)) => Self::parse(&raw).unwrap_or_else(|| {
                debug!(value = %raw, "ignoring unknown stored variant");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(error = %err, "preference storage unreadable, using default variant");
                Self::default()
            }
        }
    }

    /// Persist the preference. Failure is logged and otherwise ignored.
    pub fn save<S: PreferenceStore + ?Sized>(self, store: &mut S, key: &str) {
        if let Err(err) = store.store(key, self.as_str()) {
            warn!(error = %err, "preference not persisted");
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory [`PreferenceStore`].
///
/// Used by tests and as the fallback when the platform has no storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    unavailable: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with [`StorageError::Unavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            entries: BTreeMap::new(),
            unavailable: true,
        }
    }

    /// Raw stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
