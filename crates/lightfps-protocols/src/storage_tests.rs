use serde_json::json;

use super::*;

#[test]
fn test_touches() {
    let change = SettingsChange::new(StorageArea::Sync).with_change(
        "soundPreset",
        Some(json!("flat")),
        Some(json!("bass")),
    );
    assert!(change.touches(&["betterSound", "soundPreset"]));
    assert!(!change.touches(&["autoOptimize"]));
    assert_eq!(change.keys().collect::<Vec<_>>(), vec!["soundPreset"]);
}

#[test]
fn test_area_serde() {
    assert_eq!(serde_json::to_value(StorageArea::Sync).unwrap(), json!("sync"));
    let area: StorageArea = serde_json::from_value(json!("local")).unwrap();
    assert_eq!(area, StorageArea::Local);
    assert_eq!(StorageArea::Managed.to_string(), "managed");
}

#[test]
fn test_value_change_wire_names() {
    let change = ValueChange {
        old_value: None,
        new_value: Some(json!(true)),
    };
    assert_eq!(serde_json::to_value(&change).unwrap(), json!({ "newValue": true }));
}

#[test]
fn test_change_batch_round_trip() {
    let change = SettingsChange::new(StorageArea::Sync)
        .with_change("autoOptimize", Some(json!(false)), Some(json!(true)))
        .with_change("enableDarkMode", None, Some(json!(true)));
    let text = serde_json::to_string(&change).unwrap();
    let parsed: SettingsChange = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, change);
}
