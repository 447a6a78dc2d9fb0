#![forbid(unsafe_code)]

//! Translation of browser payloads into backend types.

use serde_json::Value;
use xtint_backend::{MutationKind, StorageChange, StorageChanges};

/// Map a `MutationRecord.type` string.
#[must_use]
pub fn mutation_kind(name: &str) -> Option<MutationKind> {
    match name {
        "childList" => Some(MutationKind::ChildList),
        "attributes" => Some(MutationKind::Attributes),
        "characterData" => Some(MutationKind::CharacterData),
        _ => None,
    }
}

/// Decode the `changes` argument of `chrome.storage.onChanged`, i.e.
/// `{ key: { oldValue?, newValue? } }`. Entries that are not objects are
/// dropped.
#[must_use]
pub fn storage_changes(value: &Value) -> StorageChanges {
    let Some(entries) = value.as_object() else {
        return StorageChanges::new();
    };
    entries
        .iter()
        .filter_map(|(key, change)| {
            let change = change.as_object()?;
            Some((
                key.clone(),
                StorageChange {
                    old_value: change.get("oldValue").cloned(),
                    new_value: change.get("newValue").cloned(),
                },
            ))
        })
        .collect()
}
