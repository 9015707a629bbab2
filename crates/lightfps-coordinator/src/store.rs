//! Pieces shared by the settings store implementations.

use lightfps_protocols::{SettingsChange, StorageArea};
use serde_json::{Map, Value};

/// Change batches buffered per subscriber before it starts lagging.
pub const CHANGE_FEED_CAPACITY: usize = 64;

/// Merge `items` into `values`, returning the batch of keys whose value
/// actually changed. Writing a key's current value is not a change.
pub fn diff_items(
    area: StorageArea,
    values: &mut Map<String, Value>,
    items: Map<String, Value>,
) -> SettingsChange {
    let mut change = SettingsChange::new(area);
    for (key, new_value) in items {
        let old_value = values.get(&key).cloned();
        if old_value.as_ref() == Some(&new_value) {
            continue;
        }
        values.insert(key.clone(), new_value.clone());
        change = change.with_change(key, old_value, Some(new_value));
    }
    change
}

/// The stored subset of `keys`.
pub(crate) fn pick(values: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| {
            values
                .get(*key)
                .map(|value| (key.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_diff_records_only_changed_keys() {
        let mut values = map(json!({ "autoOptimize": true, "soundPreset": "flat" }));
        let change = diff_items(
            StorageArea::Sync,
            &mut values,
            map(json!({ "autoOptimize": true, "soundPreset": "bass", "betterSound": true })),
        );

        assert_eq!(
            change.keys().collect::<Vec<_>>(),
            vec!["betterSound", "soundPreset"]
        );
        let preset = &change.changes["soundPreset"];
        assert_eq!(preset.old_value, Some(json!("flat")));
        assert_eq!(preset.new_value, Some(json!("bass")));
        assert_eq!(change.changes["betterSound"].old_value, None);
        assert_eq!(values["soundPreset"], json!("bass"));
    }

    #[test]
    fn test_diff_of_same_values_is_empty() {
        let mut values = map(json!({ "enableDarkMode": false }));
        let change = diff_items(
            StorageArea::Local,
            &mut values,
            map(json!({ "enableDarkMode": false })),
        );
        assert!(change.changes.is_empty());
        assert_eq!(change.area, StorageArea::Local);
    }

    #[test]
    fn test_pick_skips_missing_keys() {
        let values = map(json!({ "a": 1, "b": 2 }));
        let picked = pick(&values, &["b", "c"]);
        assert_eq!(Value::Object(picked), json!({ "b": 2 }));
    }
}
