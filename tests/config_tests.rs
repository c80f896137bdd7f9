// Integration tests for configuration loading and validation

mod common;

use std::env;
use std::fs;

use serial_test::serial;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use common::create_test_config;
use stale_order_reaper::config::{API_KEY_ENV, API_SECRET_ENV};
use stale_order_reaper::{Config, ConfigError};

fn clear_credential_env() {
    env::remove_var(API_KEY_ENV);
    env::remove_var(API_SECRET_ENV);
}

#[test]
#[serial]
fn test_config_file_round_trip() {
    clear_credential_env();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");

    let mut config = create_test_config();
    config.reconciler.pair = "XXBTZUSD".to_string();
    config.reconciler.poll_interval_seconds = 30;
    config.to_file(&config_path).expect("Failed to write config");

    let loaded = Config::from_file(&config_path).expect("Failed to load config");

    assert_eq!(loaded.reconciler.pair, "XXBTZUSD");
    assert_eq!(loaded.reconciler.poll_interval_seconds, 30);
    assert_eq!(loaded.api.api_key, "test-key");
}

#[test]
#[serial]
fn test_shipped_example_config_parses() {
    clear_credential_env();
    let example = include_str!("../config.toml.example");
    let config: Config = toml::from_str(example).expect("example config must parse");

    assert_eq!(config.reconciler.fast_window, 5);
    assert_eq!(config.reconciler.slow_window, 15);
    // Placeholder credentials are only acceptable for key-less commands
    assert_err!(config.validate(false));
    assert_ok!(config.validate(true));
}

#[test]
#[serial]
fn test_missing_file_reports_not_initialized() {
    let temp_dir = TempDir::new().unwrap();
    let result = Config::load_or_error(temp_dir.path().join("absent.toml"), false);

    match result {
        Err(ConfigError::NotInitialized(msg)) => assert!(msg.contains("reaper init")),
        other => panic!("expected NotInitialized, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_invalid_toml_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[api\napi_key = ").unwrap();

    assert!(matches!(Config::from_file(&config_path), Err(ConfigError::Parse(_))));
}

#[test]
#[serial]
fn test_invalid_windows_rejected_on_load() {
    clear_credential_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
            [api]
            api_key = "abc"
            api_secret = "ZGVm"

            [reconciler]
            fast_window = 20
            slow_window = 15
        "#,
    )
    .unwrap();

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("fast_window")));
}

#[test]
#[serial]
fn test_env_credentials_override_placeholders() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    Config::default().to_file(&config_path).unwrap();

    // Placeholders alone are rejected
    clear_credential_env();
    assert_err!(Config::from_file(&config_path));

    env::set_var(API_KEY_ENV, "env-key");
    env::set_var(API_SECRET_ENV, " ZW52LXNlY3JldA== ");
    let loaded = Config::from_file(&config_path);
    clear_credential_env();

    let loaded = assert_ok!(loaded);
    assert_eq!(loaded.api.api_key, "env-key");
    assert_eq!(loaded.api.api_secret, "ZW52LXNlY3JldA==");
    assert!(loaded.has_valid_api_keys());
}

#[test]
#[serial]
fn test_blank_env_values_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    create_test_config().to_file(&config_path).unwrap();

    env::set_var(API_KEY_ENV, "   ");
    let loaded = Config::from_file(&config_path);
    clear_credential_env();

    assert_eq!(assert_ok!(loaded).api.api_key, "test-key");
}

#[test]
#[serial]
fn test_signal_command_loads_without_keys() {
    clear_credential_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    Config::default().to_file(&config_path).unwrap();

    assert_ok!(Config::load_or_error(&config_path, true));
    assert!(matches!(
        Config::load_or_error(&config_path, false),
        Err(ConfigError::Validation(_))
    ));
}
