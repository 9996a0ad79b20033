//! Integration tests for configuration file I/O
//!
//! Tests that configuration values survive a save/load cycle and that
//! invalid files are reported with the right error.

use relaydeck_core::config::toml_config;
use relaydeck_core::config::{AppConfig, ConnectConfig};
use relaydeck_core::dns::DnsSettings;
use relaydeck_core::error::{ConfigError, RelaydeckError};
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to write raw TOML into a temporary config file
fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("Failed to write test config");
    path
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let config = toml_config::load_config_from_path(&path).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");
    let config = AppConfig {
        connect: ConnectConfig {
            debounce_ms: 120,
            is_play_build: true,
            account_url: "https://example.net/account".to_string(),
            expiry_warning_days: 7,
        },
        dns: DnsSettings {
            allow_lan: true,
            custom: vec!["10.0.0.53".parse().unwrap()],
        },
    };

    // Parent directories are created on save
    toml_config::save_config_to_path(&config, &path).unwrap();
    let loaded = toml_config::load_config_from_path(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_values_fail_validation_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        r#"
        [connect]
        debounce_ms = 0
        "#,
    );

    let result = toml_config::load_config_from_path(&path);
    assert!(matches!(
        result,
        Err(RelaydeckError::Config(ConfigError::ValidationError { .. }))
    ));
}

#[test]
fn test_malformed_toml_is_a_toml_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "[connect\ndebounce_ms = ");

    let result = toml_config::load_config_from_path(&path);
    assert!(matches!(result, Err(RelaydeckError::Toml(_))));
}

#[test]
fn test_invalid_config_is_not_saved() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    let mut config = AppConfig::default();
    config.connect.account_url = "mailto:support@relaydeck.net".to_string();

    let result = toml_config::save_config_to_path(&config, &path);
    assert!(matches!(
        result,
        Err(RelaydeckError::Config(ConfigError::ValidationError { .. }))
    ));
    assert!(!path.exists());
}
