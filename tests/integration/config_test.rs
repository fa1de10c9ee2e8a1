//! Integration tests for configuration loading

use price_feed::config::Config;
use price_feed::feed::ConnectorSettings;
use price_feed::telemetry::LogFormat;
use std::time::Duration;

#[test]
fn test_example_config_loads() {
    let config = Config::load("config.toml.example").unwrap();

    assert_eq!(config.feed.symbols.len(), 21);
    assert!(config.feed.symbols.contains(&"VETUSDT".to_string()));
    assert_eq!(config.api.default_per_page, 10);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
}

#[test]
fn test_connector_settings_from_config() {
    let config = Config::load("config.toml.example").unwrap();
    let settings = ConnectorSettings::from(&config.feed);

    assert_eq!(settings.message_spacing, Duration::from_millis(200));
    assert_eq!(settings.initial_backoff, Duration::from_secs(2));
    assert_eq!(settings.backoff_multiplier, 1.5);
    assert_eq!(settings.max_backoff, Duration::from_secs(60));
}

#[test]
fn test_invalid_config_file_rejected() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[feed]\nsymbols = []\n").unwrap();

    assert!(Config::load(&path).is_err());
}
