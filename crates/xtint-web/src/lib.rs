#![forbid(unsafe_code)]

//! Browser shim for xtint.
//!
//! Binds the `xtint-backend` capability traits to the live DOM through
//! `web-sys`, and the configuration store to `chrome.storage`. Two objects
//! are exported to JavaScript:
//!
//! - `startThemer(configJson?)`, called once from the content script, and
//! - `SettingsPanel`, driven by the extension popup.
//!
//! Payload conversion and console logging are host-agnostic and tested
//! natively; the DOM and storage bindings compile only on `wasm32`.

pub mod convert;
pub mod error;
pub mod logging;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod storage;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use error::HostError;

#[cfg(target_arch = "wasm32")]
pub use dom::{WebElement, WebPage};
#[cfg(target_arch = "wasm32")]
pub use storage::ChromeStorage;
#[cfg(target_arch = "wasm32")]
pub use wasm::{SettingsPanel, start_themer};
