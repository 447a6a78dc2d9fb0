#![forbid(unsafe_code)]

//! Runtime configuration as data.
//!
//! Every tunable that is tied to the host page or the browser store lives in
//! [`ThemerConfig`], so retargeting the themer is a JSON edit:
//!
//! ```json
//! {
//!   "style_id": "x-custom-theme-style",
//!   "content_root_selector": "#react-root",
//!   "storage_area": "sync",
//!   "storage_keys": { "background": "bgColor", "text": "textColor", "border": "borderColor" },
//!   "defaults": { "background": "#15202b", "text": "#e7e9ea", "border": "#38444d" }
//! }
//! ```
//!
//! Missing fields take their defaults, so `{}` is a valid config.

use serde::{Deserialize, Serialize};
use xtint_backend::{StorageArea, StoredValues};

use crate::theme::{Theme, ThemeField, normalize_value};

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse themer config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("themer config validation failed: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Storage key for each theme field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub background: String,
    pub text: String,
    pub border: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            background: "bgColor".into(),
            text: "textColor".into(),
            border: "borderColor".into(),
        }
    }
}

impl StorageKeys {
    #[must_use]
    pub fn key(&self, field: ThemeField) -> &str {
        match field {
            ThemeField::Background => &self.background,
            ThemeField::Text => &self.text,
            ThemeField::Border => &self.border,
        }
    }

    /// All three keys, in field order.
    #[must_use]
    pub fn all(&self) -> [&str; 3] {
        [&self.background, &self.text, &self.border]
    }

    /// Build a theme from stored values; each field falls back to
    /// `defaults` independently.
    #[must_use]
    pub fn read_theme(&self, values: &StoredValues, defaults: &Theme) -> Theme {
        let mut theme = defaults.clone();
        for field in ThemeField::ALL {
            theme.set(
                field,
                normalize_value(values.get(self.key(field)), defaults.get(field)),
            );
        }
        theme
    }

    /// Serialize a theme into store values under these keys.
    #[must_use]
    pub fn write_theme(&self, theme: &Theme) -> StoredValues {
        ThemeField::ALL
            .into_iter()
            .map(|field| {
                (
                    self.key(field).to_owned(),
                    serde_json::Value::String(theme.get(field).to_string()),
                )
            })
            .collect()
    }
}

/// Top-level configuration for the themer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemerConfig {
    /// Id of the injected `<style>` element.
    pub style_id: String,
    /// Selector of the page's primary content container. `<body>` is used
    /// when nothing matches.
    pub content_root_selector: String,
    /// Only change notifications from this storage area are honored.
    pub storage_area: String,
    pub storage_keys: StorageKeys,
    /// Built-in colors used when stored values are missing or malformed.
    pub defaults: Theme,
}

impl Default for ThemerConfig {
    fn default() -> Self {
        Self {
            style_id: "x-custom-theme-style".into(),
            content_root_selector: "#react-root".into(),
            storage_area: "sync".into(),
            storage_keys: StorageKeys::default(),
            defaults: Theme::dim(),
        }
    }
}

impl ThemerConfig {
    /// Load from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        Ok(config)
    }

    /// Validate all fields. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.style_id.trim().is_empty() {
            errors.push("style_id must not be empty".into());
        }
        if self.style_id.chars().any(char::is_whitespace) {
            errors.push(format!("style_id must not contain whitespace, got {:?}", self.style_id));
        }
        if self.content_root_selector.trim().is_empty() {
            errors.push("content_root_selector must not be empty".into());
        }
        if self.storage_area.trim().is_empty() {
            errors.push("storage_area must not be empty".into());
        }

        let keys = self.storage_keys.all();
        if keys.iter().any(|k| k.is_empty()) {
            errors.push("storage_keys entries must not be empty".into());
        }
        if keys[0] == keys[1] || keys[1] == keys[2] || keys[0] == keys[2] {
            errors.push(format!("storage_keys must be distinct, got {keys:?}"));
        }

        errors
    }

    /// The storage area whose change notifications are honored.
    #[must_use]
    pub fn honored_area(&self) -> StorageArea {
        StorageArea::from_name(&self.storage_area)
    }
}
