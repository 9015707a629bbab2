//! `lightfps settings` and `lightfps presets`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};
use tracing::info;

use lightfps_config::{ConfigLoader, Settings, SoundPreset};
use lightfps_coordinator::FileSettingsStore;
use lightfps_protocols::SettingsStore;

use crate::cli::{SettingsAction, split_pair};
use crate::cmd_optimize::load_config;

/// `<config dir>/lightfps/settings.json`.
pub(crate) fn default_store_path() -> PathBuf {
    ConfigLoader::default_dir().join("settings.json")
}

pub(crate) async fn handle_settings_command(action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::Show { store, json } => {
            let store = open_store(store);
            settings_show(&store, json).await
        }
        SettingsAction::Set { pairs, store } => {
            let store = open_store(store);
            settings_set(&store, &pairs).await
        }
    }
}

fn open_store(path: Option<PathBuf>) -> FileSettingsStore {
    FileSettingsStore::new(path.unwrap_or_else(default_store_path))
}

async fn read_settings(store: &FileSettingsStore) -> anyhow::Result<Settings> {
    let values = store
        .get(&Settings::KEYS)
        .await
        .with_context(|| format!("reading {}", store.path().display()))?;
    Ok(Settings::from_values(&values))
}

async fn settings_show(store: &FileSettingsStore, json: bool) -> anyhow::Result<()> {
    let settings = read_settings(store).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }
    println!("Settings ({})", store.path().display());
    for (key, value) in settings.to_values() {
        let shown = match value {
            Value::String(s) => s,
            Value::Bool(true) => "on".to_string(),
            Value::Bool(false) => "off".to_string(),
            other => other.to_string(),
        };
        println!("  {key:<22} {shown}");
    }
    Ok(())
}

async fn settings_set(store: &FileSettingsStore, pairs: &[String]) -> anyhow::Result<()> {
    let mut settings = read_settings(store).await?;
    let mut keys = Vec::new();
    for pair in pairs {
        let (key, value) = split_pair(pair)?;
        settings.set_key(key, value)?;
        keys.push(key.to_string());
    }

    let all = settings.to_values();
    let items: Map<String, Value> = keys
        .iter()
        .filter_map(|key| all.get(key).map(|value| (key.clone(), value.clone())))
        .collect();
    store
        .set(items)
        .await
        .with_context(|| format!("writing {}", store.path().display()))?;
    info!("Updated {} setting(s) in {}", keys.len(), store.path().display());
    Ok(())
}

pub(crate) fn handle_presets(config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let eq = &config.equalizer;
    println!(
        "Equalizer: low shelf {} Hz, peaking {} Hz (Q {}), high shelf {} Hz",
        eq.low_frequency, eq.mid_frequency, eq.mid_q, eq.high_frequency
    );
    println!("  {:<8} {:>6} {:>6} {:>6}", "preset", "low", "mid", "high");
    for preset in SoundPreset::ALL {
        let gains = eq.gains(preset);
        println!(
            "  {:<8} {:>6.1} {:>6.1} {:>6.1}",
            preset.as_str(),
            gains.low,
            gains.mid,
            gains.high
        );
    }
    Ok(())
}
