#![forbid(unsafe_code)]

//! Test harness for xtint.
//!
//! [`FakePage`] implements every host capability from `xtint-backend`
//! against an in-memory element tree with scripted computed styles and
//! manually-stepped frames. [`MemoryStore`] stands in for the browser's
//! synced storage. Together they let the theming core run end-to-end
//! without a browser.

pub mod page;
pub mod store;

pub use page::{ElementId, FakePage, FakePageError, NodeSpec, ObservationId};
pub use store::MemoryStore;
