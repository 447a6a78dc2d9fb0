#![forbid(unsafe_code)]

//! Theme controller: owns the active theme and wires configuration,
//! stylesheet, scheduler and observer together.
//!
//! The controller is host-driven. The host awaits the initial store read
//! and hands the result to [`ThemeController::activate`], forwards storage
//! change notifications, forwards observed mutations, and calls
//! [`ThemeController::on_frame`] from its paint callback. Nothing here
//! blocks or spawns.

use xtint_backend::{
    ConfigStore, MutationRecord, Page, StorageArea, StorageChanges, StoreError, StoredValues,
};

use crate::config::ThemerConfig;
use crate::observer::{ObserverBridge, deliver};
use crate::scheduler::{FlushReport, MutationScheduler};
use crate::stylesheet::build_css;
use crate::theme::{Theme, ThemeField, normalize_value};

/// Lifecycle of a [`ThemeController`]. There is no way back from `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Active,
}

/// Read the persisted theme values for `config` from `store`.
pub async fn load_stored_theme<S: ConfigStore>(
    store: &S,
    config: &ThemerConfig,
) -> Result<StoredValues, StoreError> {
    store.get(&config.storage_keys.all()).await
}

/// Orchestrates theme application on one page.
pub struct ThemeController<P: Page> {
    config: ThemerConfig,
    state: ControllerState,
    theme: Theme,
    scheduler: MutationScheduler<P::Element>,
    bridge: ObserverBridge<P::Observation>,
}

impl<P: Page> core::fmt::Debug for ThemeController<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThemeController")
            .field("state", &self.state)
            .field("theme", &self.theme)
            .field("pending", &self.scheduler.pending_len())
            .field("observing", &self.bridge.is_observing())
            .finish()
    }
}

impl<P: Page> ThemeController<P> {
    #[must_use]
    pub fn new(config: ThemerConfig) -> Self {
        let theme = config.defaults.clone();
        Self {
            config,
            state: ControllerState::Uninitialized,
            theme,
            scheduler: MutationScheduler::new(),
            bridge: ObserverBridge::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The theme currently enforced.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[must_use]
    pub fn config(&self) -> &ThemerConfig {
        &self.config
    }

    #[must_use]
    pub fn scheduler(&self) -> &MutationScheduler<P::Element> {
        &self.scheduler
    }

    /// Primary content container, or the body when it is absent.
    pub fn content_root(&self, page: &P) -> Option<P::Element> {
        page.query_selector(&self.config.content_root_selector)
            .or_else(|| page.body())
    }

    /// Enter `Active`: adopt the loaded theme (defaults if loading failed),
    /// install the stylesheet, queue a full-tree pass and start observing.
    ///
    /// Activating again re-applies `loaded` and restarts observation.
    pub fn activate(&mut self, page: &mut P, loaded: Result<StoredValues, StoreError>) {
        let theme = match loaded {
            Ok(values) => self
                .config
                .storage_keys
                .read_theme(&values, &self.config.defaults),
            Err(err) => {
                tracing::warn!(
                    target: "xtint.controller",
                    %err,
                    "failed to load saved theme values; using defaults"
                );
                self.config.defaults.clone()
            }
        };
        self.apply_theme(page, theme);

        let root = self.content_root(page);
        self.bridge.start(page, root.as_ref());
        self.state = ControllerState::Active;
        tracing::info!(target: "xtint.controller", theme = ?self.theme, "themer active");
    }

    /// Replace the active theme, rebuild the stylesheet and queue a pass
    /// over the content root.
    pub fn apply_theme(&mut self, page: &mut P, theme: Theme) {
        self.theme = theme;
        let css = build_css(&self.theme);
        if let Err(err) = page.install_stylesheet(&self.config.style_id, &css) {
            tracing::warn!(target: "xtint.controller", %err, "stylesheet not installed");
        }
        match self.content_root(page) {
            Some(root) => {
                self.scheduler.enqueue(root, page);
            }
            None => tracing::debug!(target: "xtint.controller", "no content root; pass skipped"),
        }
    }

    /// Handle a storage change notification. Only the honored area counts,
    /// and only while active. Each changed field is normalized against its
    /// built-in default; unchanged fields keep their current value.
    ///
    /// Returns whether the theme was re-applied.
    pub fn handle_storage_change(
        &mut self,
        page: &mut P,
        changes: &StorageChanges,
        area: &StorageArea,
    ) -> bool {
        if self.state != ControllerState::Active {
            return false;
        }
        if *area != self.config.honored_area() {
            tracing::trace!(target: "xtint.controller", area = area.name(), "change in other area ignored");
            return false;
        }

        let mut next = self.theme.clone();
        let mut changed = false;
        for field in ThemeField::ALL {
            let Some(change) = changes.get(self.config.storage_keys.key(field)) else {
                continue;
            };
            next.set(
                field,
                normalize_value(change.new_value.as_ref(), self.config.defaults.get(field)),
            );
            changed = true;
        }
        if !changed {
            return false;
        }

        tracing::debug!(target: "xtint.controller", theme = ?next, "theme changed");
        self.apply_theme(page, next);
        true
    }

    /// Forward observed mutations into the scheduler.
    pub fn handle_mutations(&mut self, page: &mut P, records: &[MutationRecord<P::Element>]) -> usize {
        if !self.bridge.is_observing() {
            return 0;
        }
        deliver(page, records, &mut self.scheduler)
    }

    /// Paint callback: flush the pending batch with the active theme.
    pub fn on_frame(&mut self, page: &mut P) -> FlushReport {
        self.scheduler.flush(page, &self.theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xtint_backend::StorageChange;
    use xtint_harness::{FakePage, NodeSpec};

    fn controller() -> ThemeController<FakePage> {
        ThemeController::new(ThemerConfig::default())
    }

    fn change(value: serde_json::Value) -> StorageChange {
        StorageChange {
            old_value: None,
            new_value: Some(value),
        }
    }

    #[test]
    fn starts_uninitialized_with_defaults() {
        let ctl = controller();
        assert_eq!(ctl.state(), ControllerState::Uninitialized);
        assert_eq!(ctl.theme(), &Theme::dim());
    }

    #[test]
    fn activate_installs_css_queues_root_and_observes() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let root = page.append(body, NodeSpec::new("div").id("react-root"));
        let mut ctl = controller();

        ctl.activate(&mut page, Ok(StoredValues::new()));

        assert_eq!(ctl.state(), ControllerState::Active);
        assert_eq!(
            page.stylesheet("x-custom-theme-style"),
            Some(build_css(&Theme::dim()).as_str())
        );
        assert_eq!(page.stylesheet_parent("x-custom-theme-style"), page.head());
        assert!(ctl.scheduler().is_pending(&root));
        assert_eq!(page.observed_roots(), vec![root]);
        assert_eq!(page.frames_requested(), 1);
    }

    #[test]
    fn content_root_falls_back_to_body() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let mut ctl = controller();
        ctl.activate(&mut page, Ok(StoredValues::new()));
        assert!(ctl.scheduler().is_pending(&body));
        assert_eq!(page.observed_roots(), vec![body]);
    }

    #[test]
    fn missing_body_and_root_is_silent() {
        let mut page = FakePage::bare();
        let mut ctl = controller();
        ctl.activate(&mut page, Ok(StoredValues::new()));
        assert_eq!(ctl.state(), ControllerState::Active);
        assert_eq!(ctl.scheduler().pending_len(), 0);
        assert!(page.observed_roots().is_empty());
        assert_eq!(page.stylesheet_parent("x-custom-theme-style"), Some(page.html()));
    }

    #[test]
    fn load_failure_falls_back_to_defaults() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        ctl.activate(&mut page, Err(StoreError::Unavailable("offline".into())));
        assert_eq!(ctl.theme(), &Theme::dim());
        assert!(page.stylesheet("x-custom-theme-style").is_some());
    }

    #[test]
    fn changes_before_activation_are_ignored() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        let mut changes = StorageChanges::new();
        changes.insert("bgColor".into(), change(json!("#000000")));
        assert!(!ctl.handle_storage_change(&mut page, &changes, &StorageArea::Sync));
        assert!(page.stylesheet("x-custom-theme-style").is_none());
    }

    #[test]
    fn changes_in_other_areas_are_ignored() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        ctl.activate(&mut page, Ok(StoredValues::new()));
        let mut changes = StorageChanges::new();
        changes.insert("bgColor".into(), change(json!("#000000")));
        assert!(!ctl.handle_storage_change(&mut page, &changes, &StorageArea::Local));
        assert_eq!(ctl.theme(), &Theme::dim());
    }

    #[test]
    fn unrelated_keys_do_not_rebuild() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        ctl.activate(&mut page, Ok(StoredValues::new()));
        let mut changes = StorageChanges::new();
        changes.insert("unrelated".into(), change(json!(1)));
        assert!(!ctl.handle_storage_change(&mut page, &changes, &StorageArea::Sync));
    }

    #[test]
    fn change_updates_only_named_fields_with_default_fallback() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        let mut stored = StoredValues::new();
        stored.insert("textColor".into(), json!("#111111"));
        stored.insert("borderColor".into(), json!("#222222"));
        ctl.activate(&mut page, Ok(stored));

        let mut changes = StorageChanges::new();
        changes.insert("bgColor".into(), change(json!("#ABCDEF")));
        changes.insert("borderColor".into(), change(json!("nope")));
        assert!(ctl.handle_storage_change(&mut page, &changes, &StorageArea::Sync));

        assert_eq!(ctl.theme().background.as_str(), "#abcdef");
        assert_eq!(ctl.theme().text.as_str(), "#111111");
        assert_eq!(ctl.theme().border, Theme::dim().border);
        let css = page.stylesheet("x-custom-theme-style").unwrap();
        assert!(css.contains("html { background-color: #abcdef !important; }"));
        assert_eq!(page.style_tag_count(), 1);
    }

    #[test]
    fn removed_key_falls_back_to_default() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        let mut stored = StoredValues::new();
        stored.insert("bgColor".into(), json!("#000000"));
        ctl.activate(&mut page, Ok(stored));

        let mut changes = StorageChanges::new();
        changes.insert(
            "bgColor".into(),
            StorageChange {
                old_value: Some(json!("#000000")),
                new_value: None,
            },
        );
        assert!(ctl.handle_storage_change(&mut page, &changes, &StorageArea::Sync));
        assert_eq!(ctl.theme().background, Theme::dim().background);
    }

    #[test]
    fn mutations_before_activation_are_dropped() {
        let mut page = FakePage::new();
        let mut ctl = controller();
        let records = vec![MutationRecord::child_list([page.body_id()])];
        assert_eq!(ctl.handle_mutations(&mut page, &records), 0);
    }
}
