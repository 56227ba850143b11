//! Integration tests for configuration validation
//!
//! Verifies that invalid configurations are rejected at startup
//! (Config::from_file()) rather than causing runtime errors. Tests the full
//! path: file -> parse -> validate, and that each phase reports a distinct
//! error carrying the file path.

use std::io::Write;
use tempfile::NamedTempFile;
use thriftroute::config::Config;
use thriftroute::error::AppError;
use thriftroute::registry::Provider;

/// Helper to create a temporary config file with given TOML content
fn create_temp_config(toml_content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(toml_content.as_bytes())
        .expect("Failed to write temp file");
    temp_file.flush().expect("Failed to flush temp file");
    temp_file
}

#[test]
fn test_config_from_file_loads_valid_config() {
    let temp_file = create_temp_config(
        r#"
[providers.google]
api_key = "AIza-test"

[classifier]
simple_max = 0.2
complex_min = 0.6

[observability]
log_level = "warn"
"#,
    );

    let config = Config::from_file(temp_file.path()).expect("valid config should load");
    assert!(config.provider_availability().is_configured(Provider::Google));
    assert_eq!(config.classifier().simple_max(), 0.2);
    assert_eq!(config.log_level(), "warn");
}

#[test]
fn test_missing_file_reports_read_phase() {
    let result = Config::from_file("/nonexistent/thriftroute-test/config.toml");

    match result {
        Err(AppError::ConfigFileRead { path, .. }) => {
            assert!(path.contains("config.toml"), "got path: {}", path);
        }
        other => panic!("expected ConfigFileRead, got: {:?}", other),
    }
}

#[test]
fn test_invalid_toml_reports_parse_phase() {
    let temp_file = create_temp_config("providers = not valid toml [");
    let result = Config::from_file(temp_file.path());

    match result {
        Err(AppError::ConfigParseFailed { path, .. }) => {
            assert!(!path.is_empty());
        }
        other => panic!("expected ConfigParseFailed, got: {:?}", other),
    }
}

#[test]
fn test_semantic_error_reports_validation_phase_with_reason() {
    let temp_file = create_temp_config(
        r#"
[classifier]
simple_max = 0.9
complex_min = 0.2
"#,
    );
    let result = Config::from_file(temp_file.path());

    match result {
        Err(AppError::ConfigValidationFailed { reason, .. }) => {
            assert!(
                reason.contains("strictly below"),
                "reason should name the threshold rule, got: {}",
                reason
            );
        }
        other => panic!("expected ConfigValidationFailed, got: {:?}", other),
    }
}

#[test]
fn test_equal_thresholds_are_rejected() {
    // Boundaries are inclusive on both sides, so equality would make a
    // composite of exactly that value both simple and complex
    let temp_file = create_temp_config(
        r#"
[classifier]
simple_max = 0.5
complex_min = 0.5
"#,
    );
    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_threshold_outside_unit_interval_is_rejected() {
    let temp_file = create_temp_config(
        r#"
[classifier]
simple_max = 0.3
complex_min = 1.5
"#,
    );
    let err = Config::from_file(temp_file.path())
        .unwrap_err()
        .to_string();
    assert!(
        err.contains("between 0.0 and 1.0"),
        "error should name the valid range, got: {}",
        err
    );
}

#[test]
fn test_empty_file_is_a_valid_local_only_config() {
    let temp_file = create_temp_config("");
    let config = Config::from_file(temp_file.path()).expect("empty config should load");

    let availability = config.provider_availability();
    assert!(availability.is_configured(Provider::Local));
    assert_eq!(
        availability.providers().len(),
        1,
        "only the local provider should be configured"
    );
}

#[test]
fn test_blank_api_key_is_rejected_with_field_name() {
    let temp_file = create_temp_config(
        r#"
[providers.anthropic]
api_key = "   "
"#,
    );
    let err = Config::from_file(temp_file.path())
        .unwrap_err()
        .to_string();
    assert!(
        err.contains("providers.anthropic.api_key"),
        "error should name the offending field, got: {}",
        err
    );
}
