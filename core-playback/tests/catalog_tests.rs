//! Configuration catalog loading from real files.

use bridge_traits::{PerformanceMode, SharingMode, Usage};
use core_playback::catalog::{emergency_config, EMERGENCY_DESCRIPTION};
use core_playback::{ConfigCatalog, ConfigOrigin, ConfigSources};
use std::fs;
use tempfile::TempDir;

const OVERRIDE: &str = r#"{
  "configs": [
    {
      "usage": "AAUDIO_USAGE_ALARM",
      "contentType": "AAUDIO_CONTENT_TYPE_SONIFICATION",
      "performanceMode": "AAUDIO_PERFORMANCE_MODE_POWER_SAVING",
      "sharingMode": "AAUDIO_SHARING_MODE_EXCLUSIVE",
      "audioFilePath": "/sdcard/alarm.wav",
      "description": "Custom Alarm"
    },
    {
      "audioFilePath": "/sdcard/notes.txt",
      "description": "Not Audio"
    }
  ]
}"#;

fn write_override(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("aaudio_player_configs.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_override_file_takes_precedence_over_bundled() {
    let dir = TempDir::new().unwrap();
    let path = write_override(&dir, OVERRIDE);

    let catalog = ConfigCatalog::load(ConfigSources::default().with_override_path(&path));

    assert_eq!(catalog.origin(), &ConfigOrigin::Override(path));
    // The non-wav entry is dropped.
    assert_eq!(catalog.len(), 1);

    let alarm = catalog.default_config();
    assert_eq!(alarm.usage(), Usage::Alarm);
    assert_eq!(alarm.performance_mode(), PerformanceMode::PowerSaving);
    assert_eq!(alarm.sharing_mode(), SharingMode::Exclusive);
    assert_eq!(alarm.source_path(), "/sdcard/alarm.wav");
    assert_eq!(catalog.find_by_description("Custom Alarm"), Some(&alarm));
    assert!(catalog.find_by_description("Not Audio").is_none());
}

#[test]
fn test_missing_override_falls_back_to_bundled() {
    let dir = TempDir::new().unwrap();
    let absent = dir.path().join("absent.json");

    let catalog = ConfigCatalog::load(ConfigSources::default().with_override_path(absent));

    assert_eq!(catalog.origin(), &ConfigOrigin::Bundled);
    assert_eq!(catalog.default_config().description(), "Media - Low Latency Music");
    assert!(catalog.len() > 1);
}

#[test]
fn test_corrupt_override_falls_back_to_emergency() {
    let dir = TempDir::new().unwrap();
    let path = write_override(&dir, "{ \"configs\": [ ");

    let catalog = ConfigCatalog::load(ConfigSources::default().with_override_path(path));

    assert_eq!(catalog.origin(), &ConfigOrigin::Emergency);
    assert_eq!(catalog.configs(), &[emergency_config()]);
    assert_eq!(catalog.default_config().description(), EMERGENCY_DESCRIPTION);
}

#[test]
fn test_override_without_configs_array_falls_back_to_emergency() {
    let dir = TempDir::new().unwrap();
    let path = write_override(&dir, r#"{ "presets": [] }"#);

    let catalog = ConfigCatalog::load(ConfigSources::default().with_override_path(path));
    assert_eq!(catalog.origin(), &ConfigOrigin::Emergency);
}

#[test]
fn test_reload_picks_up_edited_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aaudio_player_configs.json");

    let mut catalog = ConfigCatalog::load(ConfigSources::default().with_override_path(&path));
    assert_eq!(catalog.origin(), &ConfigOrigin::Bundled);

    fs::write(&path, OVERRIDE).unwrap();
    catalog.reload();
    assert_eq!(catalog.origin(), &ConfigOrigin::Override(path.clone()));
    assert_eq!(catalog.default_config().description(), "Custom Alarm");

    fs::remove_file(&path).unwrap();
    catalog.reload();
    assert_eq!(catalog.origin(), &ConfigOrigin::Bundled);
}

#[test]
fn test_every_bundled_config_is_offered_in_order() {
    let catalog = ConfigCatalog::load(ConfigSources::default().without_override());

    let descriptions: Vec<_> = catalog.configs().iter().map(|c| c.description()).collect();
    assert_eq!(descriptions.first(), Some(&"Media - Low Latency Music"));
    assert!(descriptions.contains(&"Voice Communication"));
    assert_eq!(catalog.get(catalog.len()), None);
}
