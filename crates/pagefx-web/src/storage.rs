#![forbid(unsafe_code)]

//! `localStorage` as a [`PreferenceStore`].

use pagefx_core::PreferenceStore;
use pagefx_core::error::StorageError;
use web_sys::{Storage, Window};

use crate::dom::describe;

/// Preference storage backed by `window.localStorage`.
///
/// Accessing `localStorage` throws in sandboxed frames and some private
/// browsing modes; the store then reports [`StorageError::Unavailable`] on
/// every call and the page falls back to defaults.
pub(crate) struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub(crate) fn open(window: &Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }
}

impl PreferenceStore for LocalStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage
            .get_item(key)
            .map_err(|err| StorageError::Denied(describe(&err)))
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|err| StorageError::Denied(describe(&err)))
    }
}
