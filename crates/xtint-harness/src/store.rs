#![forbid(unsafe_code)]

//! In-memory [`ConfigStore`] with injectable failures.

use std::cell::{Cell, RefCell};

use xtint_backend::{ConfigStore, StorageChange, StorageChanges, StoreError, StoredValues};

/// Synchronously-resolving store. Every successful `set` also records the
/// change notification a browser would broadcast, for tests to replay.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<StoredValues>,
    notifications: RefCell<Vec<StorageChanges>>,
    fail_get: Cell<bool>,
    fail_set: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `values`.
    pub fn with_values(values: StoredValues) -> Self {
        let store = Self::new();
        *store.values.borrow_mut() = values;
        store
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.set(fail);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.set(fail);
    }

    /// Current raw value of `key`.
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.borrow().get(key).cloned()
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Drain change notifications produced by writes.
    pub fn take_notifications(&self) -> Vec<StorageChanges> {
        std::mem::take(&mut *self.notifications.borrow_mut())
    }
}

impl ConfigStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<StoredValues, StoreError> {
        if self.fail_get.get() {
            return Err(StoreError::Failed("injected read failure".into()));
        }
        let values = self.values.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| ((*key).to_owned(), v.clone())))
            .collect())
    }

    async fn set(&self, incoming: StoredValues) -> Result<(), StoreError> {
        if self.fail_set.get() {
            return Err(StoreError::Failed("injected write failure".into()));
        }
        let mut values = self.values.borrow_mut();
        let mut changes = StorageChanges::new();
        for (key, new_value) in incoming {
            let old_value = values.insert(key.clone(), new_value.clone());
            if old_value.as_ref() != Some(&new_value) {
                changes.insert(
                    key,
                    StorageChange {
                        old_value,
                        new_value: Some(new_value),
                    },
                );
            }
        }
        self.writes.set(self.writes.get() + 1);
        if !changes.is_empty() {
            self.notifications.borrow_mut().push(changes);
        }
        Ok(())
    }
}
