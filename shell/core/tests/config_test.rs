//! Configuration file loading

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use termshell_core::config::load_config_with_env;
use termshell_core::{ConfigError, ConfigSource, DEFAULT_QUEUE_CAPACITY};

fn no_env(_: &str) -> Option<String> {
    None
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_file_values_are_applied() {
    let file = write_config(
        r#"
[input]
double_click_ms = 250
mouse = true
paste = false

[dispatch]
resize_throttle_ms = 120
queue_capacity = 16
"#,
    );

    let config =
        load_config_with_env(Some(file.path().to_path_buf()), no_env).expect("config loads");

    assert_eq!(config.double_click_window, Duration::from_millis(250));
    assert_eq!(config.resize_throttle, Duration::from_millis(120));
    assert_eq!(config.queue_capacity, 16);
    assert!(config.enable_mouse);
    assert!(!config.enable_paste);
    assert_eq!(config.source(), ConfigSource::File);
    assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config("[input]\nmouse = true\n");

    let config =
        load_config_with_env(Some(file.path().to_path_buf()), no_env).expect("config loads");

    assert!(config.enable_mouse);
    assert!(config.enable_paste);
    assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
}

#[test]
fn test_environment_overrides_file() {
    let file = write_config("[input]\ndouble_click_ms = 250\n");
    let env = |key: &str| (key == "TERMSHELL_DOUBLE_CLICK_MS").then(|| "700".to_string());

    let config = load_config_with_env(Some(file.path().to_path_buf()), env).expect("config loads");

    assert_eq!(config.double_click_window, Duration::from_millis(700));
    assert_eq!(config.source(), ConfigSource::Env);
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let file = write_config("[input\nmouse = ");

    let err = load_config_with_env(Some(file.path().to_path_buf()), no_env)
        .expect_err("parse fails");

    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_zero_capacity_in_file_fails_validation() {
    let file = write_config("[dispatch]\nqueue_capacity = 0\n");

    let err = load_config_with_env(Some(file.path().to_path_buf()), no_env)
        .expect_err("validation fails");

    assert!(matches!(err, ConfigError::ValidationError(_)));
}
