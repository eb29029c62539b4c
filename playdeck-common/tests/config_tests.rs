//! Integration tests for configuration resolution and graceful degradation
//!
//! Tests that manipulate PLAYDECK_CONFIG are marked with #[serial]
//! so they run sequentially, not in parallel.

use playdeck_common::config::{load_config, resolve_config_path, ConfigSource, TomlConfig};
use playdeck_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const TEST_ENV_VAR: &str = "PLAYDECK_CONFIG_TEST";

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write temp config");
    file
}

#[test]
#[serial]
fn test_cli_argument_takes_priority_over_env() {
    let cli = write_config("[bridge]\nidle_timeout_ms = 111\n");
    let env_file = write_config("[bridge]\nidle_timeout_ms = 222\n");
    env::set_var(TEST_ENV_VAR, env_file.path());

    let (path, source) = resolve_config_path(Some(cli.path()), TEST_ENV_VAR).unwrap();
    assert_eq!(source, ConfigSource::CommandLine);
    assert_eq!(path, cli.path());

    let config = load_config(Some(cli.path()), TEST_ENV_VAR).unwrap();
    assert_eq!(config.bridge.idle_timeout_ms, 111);

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    let env_file = write_config("[logging]\nlevel = \"debug\"\n");
    env::set_var(TEST_ENV_VAR, env_file.path());

    let config = load_config(None, TEST_ENV_VAR).unwrap();
    assert_eq!(config.logging.level, "debug");

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_env_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    env::set_var(TEST_ENV_VAR, dir.path().join("absent.toml"));

    let config = load_config(None, TEST_ENV_VAR).unwrap();
    assert_eq!(config.bridge.autoplay_max_attempts, 3);
    assert_eq!(config.logging.level, "info");

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_cli_file_is_an_error() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = load_config(Some(&missing), TEST_ENV_VAR).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_malformed_file_reports_parse_error() {
    let file = write_config("[bridge\nidle_timeout_ms = 1");
    let err = TomlConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[test]
fn test_full_file_round_trip() {
    let file = write_config(
        r#"
[logging]
level = "trace"
file = "/tmp/playdeck.log"

[bridge]
idle_timeout_ms = 1500
autoplay_max_attempts = 2
autoplay_retry_delay_ms = 100
notification_capacity = 32
settle_ticks = 0
"#,
    );
    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config.logging.level, "trace");
    assert!(config.logging.file.is_some());
    assert_eq!(config.bridge.autoplay_max_attempts, 2);
    assert_eq!(config.bridge.notification_capacity, 32);
    assert_eq!(config.bridge.settle_ticks, 0);
}
