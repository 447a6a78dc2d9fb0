#![forbid(unsafe_code)]

//! Headless model behind the settings panel.
//!
//! The panel edits one color at a time. Every edit is normalized against
//! the value currently shown (not the built-in default), persisted, and
//! answered with a short status line. Rendering the panel is the host's job.

use xtint_backend::{ConfigStore, StoreError, StoredValues};

use crate::config::{StorageKeys, ThemerConfig};
use crate::theme::{Theme, ThemeField, normalize_color};

/// Status line shown after a settings action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsStatus {
    Saved,
    SaveFailed,
    /// Defaults were restored and saved.
    Reset,
    /// The stored theme could not be read; defaults are shown.
    UsingDefaults,
}

impl SettingsStatus {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "Saved",
            Self::SaveFailed => "Failed to save theme values",
            Self::Reset => "Reset to Dim defaults",
            Self::UsingDefaults => "Using default colors",
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Self::SaveFailed | Self::UsingDefaults)
    }

    /// Map a save result to its status line.
    #[must_use]
    pub fn from_save(result: &Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => Self::Saved,
            Err(err) => {
                tracing::error!(target: "xtint.settings", %err, "could not save theme values");
                Self::SaveFailed
            }
        }
    }
}

/// Current panel state.
#[derive(Debug, Clone)]
pub struct SettingsEditor {
    keys: StorageKeys,
    defaults: Theme,
    current: Theme,
}

impl SettingsEditor {
    #[must_use]
    pub fn new(config: &ThemerConfig) -> Self {
        Self {
            keys: config.storage_keys.clone(),
            defaults: config.defaults.clone(),
            current: config.defaults.clone(),
        }
    }

    #[must_use]
    pub fn current(&self) -> &Theme {
        &self.current
    }

    /// Adopt the stored theme. A read failure keeps the defaults and
    /// reports [`SettingsStatus::UsingDefaults`].
    pub fn load(&mut self, loaded: Result<StoredValues, StoreError>) -> Option<SettingsStatus> {
        match loaded {
            Ok(values) => {
                self.current = self.keys.read_theme(&values, &self.defaults);
                None
            }
            Err(err) => {
                tracing::error!(target: "xtint.settings", %err, "could not read saved theme values");
                self.current = self.defaults.clone();
                Some(SettingsStatus::UsingDefaults)
            }
        }
    }

    /// Apply a single-field edit. Malformed input keeps the current value.
    pub fn edit(&mut self, field: ThemeField, value: &str) -> &Theme {
        let next = normalize_color(value, self.current.get(field));
        self.current.set(field, next);
        &self.current
    }

    /// Restore the built-in defaults.
    pub fn reset(&mut self) -> &Theme {
        self.current = self.defaults.clone();
        &self.current
    }

    /// Store values for the current theme.
    #[must_use]
    pub fn pending_write(&self) -> StoredValues {
        self.keys.write_theme(&self.current)
    }

    /// Persist the current theme.
    pub async fn save<S: ConfigStore>(&self, store: &S) -> SettingsStatus {
        SettingsStatus::from_save(&store.set(self.pending_write()).await)
    }

    /// Reset to defaults and persist them. A failed write reports the
    /// failure instead of the reset.
    pub async fn reset_and_save<S: ConfigStore>(&mut self, store: &S) -> SettingsStatus {
        self.reset();
        match self.save(store).await {
            SettingsStatus::Saved => SettingsStatus::Reset,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xtint_harness::MemoryStore;

    fn editor() -> SettingsEditor {
        SettingsEditor::new(&ThemerConfig::default())
    }

    #[test]
    fn malformed_edit_keeps_current_value() {
        let mut ed = editor();
        ed.edit(ThemeField::Text, "#123456");
        ed.edit(ThemeField::Text, "oops");
        assert_eq!(ed.current().text.as_str(), "#123456");
    }

    #[test]
    fn edit_normalizes_case() {
        let mut ed = editor();
        let theme = ed.edit(ThemeField::Background, "#ABCDEF");
        assert_eq!(theme.background.as_str(), "#abcdef");
    }

    #[test]
    fn load_failure_reports_defaults() {
        let mut ed = editor();
        ed.edit(ThemeField::Border, "#000000");
        let status = ed.load(Err(StoreError::Failed("boom".into())));
        assert_eq!(status, Some(SettingsStatus::UsingDefaults));
        assert!(status.unwrap().is_error());
        assert_eq!(ed.current(), &Theme::dim());
    }

    #[test]
    fn save_writes_all_three_keys() {
        let store = MemoryStore::new();
        let mut ed = editor();
        ed.edit(ThemeField::Background, "#000001");
        let status = pollster::block_on(ed.save(&store));
        assert_eq!(status, SettingsStatus::Saved);
        assert_eq!(status.message(), "Saved");
        assert_eq!(store.value("bgColor"), Some(json!("#000001")));
        assert_eq!(store.value("textColor"), Some(json!("#e7e9ea")));
        assert_eq!(store.value("borderColor"), Some(json!("#38444d")));
    }

    #[test]
    fn save_failure_is_reported() {
        let store = MemoryStore::new();
        store.fail_set(true);
        let status = pollster::block_on(editor().save(&store));
        assert_eq!(status, SettingsStatus::SaveFailed);
        assert_eq!(status.message(), "Failed to save theme values");
    }

    #[test]
    fn reset_and_save_reports_reset() {
        let store = MemoryStore::new();
        let mut ed = editor();
        ed.edit(ThemeField::Text, "#000000");
        let status = pollster::block_on(ed.reset_and_save(&store));
        assert_eq!(status, SettingsStatus::Reset);
        assert_eq!(ed.current(), &Theme::dim());
        assert_eq!(store.value("textColor"), Some(json!("#e7e9ea")));

        store.fail_set(true);
        assert_eq!(
            pollster::block_on(ed.reset_and_save(&store)),
            SettingsStatus::SaveFailed
        );
    }
}
