#![forbid(unsafe_code)]

//! Theme enforcement core for xtint.
//!
//! # Role
//! Keeps a live, third-party page in a user-chosen three-color theme
//! without touching the page's own styling logic. Two mechanisms work
//! together:
//!
//! - an injected stylesheet for the page's known structural regions
//!   ([`stylesheet`]), and
//! - a per-element inline override pass that inspects *computed* colors
//!   and recolors only elements that render dark ([`pass`]), batched to at
//!   most one pass per root per paint frame ([`scheduler`]) while the page
//!   keeps inserting content ([`observer`]).
//!
//! # Host boundary
//! Everything page-facing goes through `xtint-backend` traits, so the whole
//! crate runs natively against `xtint-harness` in tests and against the
//! real DOM through `xtint-web`.

/// Computed-color parsing and dark classification.
pub mod color;
/// Runtime configuration as data.
pub mod config;
/// Orchestration of theme state, stylesheet, scheduler and observer.
pub mod controller;
/// Mutation records to scheduler.
pub mod observer;
/// Inline override pass over a subtree.
pub mod pass;
/// Frame-batched scheduling of override passes.
pub mod scheduler;
/// Headless settings panel model.
pub mod settings;
/// Stylesheet generation from a theme.
pub mod stylesheet;
/// Validated theme colors.
pub mod theme;

pub use color::{DarkPolicy, Rgba, is_dark_background, is_dark_border, parse_color};
pub use config::{ConfigError, StorageKeys, ThemerConfig};
pub use controller::{ControllerState, ThemeController, load_stored_theme};
pub use pass::{OverrideStats, apply_overrides};
pub use scheduler::{FlushReport, MutationScheduler, SchedulerStats};
pub use settings::{SettingsEditor, SettingsStatus};
pub use stylesheet::build_css;
pub use theme::{HexColor, Theme, ThemeField, normalize_color};
