#![forbid(unsafe_code)]

//! Browser adapter for pagefx.
//!
//! [`PageFx`] (wasm32 only) locates page elements by CSS selector, implements
//! the `pagefx-core` host traits on `web-sys`, and forwards window, document,
//! video, and observer events to the orchestrator.
//!
//! The selector contract and boot options live in [`selectors`] and compile
//! on every target.

pub mod selectors;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod storage;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use selectors::{BootOptions, PageSelectors};

#[cfg(target_arch = "wasm32")]
pub use wasm::PageFx;
