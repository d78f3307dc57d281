use super::data::{Config, ConfigOverrides};
use super::defaults::{DEFAULT_GREETING, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL};
use super::io::{load_system_instruction, ConfigError};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.model(), DEFAULT_MODEL);
    assert_eq!(config.greeting(), DEFAULT_GREETING);
    assert_eq!(config.request_timeout(), None);
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::with_defaults();
    config.model = Some("gemini-1.5-pro".to_string());
    config.request_timeout_secs = Some(30);
    config.save_to_path(&config_path).expect("save failed");

    let loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded, config);
    assert_eq!(loaded.model(), "gemini-1.5-pro");
    assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "temperature = 0.2\n").expect("write failed");

    let config = Config::load_from_path(&config_path).expect("load failed");
    let settings = config.generation_settings().expect("valid settings");
    assert!((settings.temperature() - 0.2).abs() < f32::EPSILON);
    assert_eq!(settings.max_output_tokens(), DEFAULT_MAX_OUTPUT_TOKENS);
    assert_eq!(config.prompt_file(), PathBuf::from("prompt.txt"));
}

#[test]
fn invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "model = [").expect("write failed");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn out_of_range_temperature_is_rejected() {
    let config = Config {
        temperature: Some(1.5),
        ..Default::default()
    };
    let err = config.validate().expect_err("temperature above 1 must fail");
    assert!(matches!(
        err,
        ConfigError::InvalidSetting {
            name: "generation",
            ..
        }
    ));
}

#[test]
fn zero_tokens_and_zero_timeout_are_rejected() {
    let zero_tokens = Config {
        max_output_tokens: Some(0),
        ..Default::default()
    };
    assert!(zero_tokens.validate().is_err());

    let zero_timeout = Config {
        request_timeout_secs: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        zero_timeout.validate(),
        Err(ConfigError::InvalidSetting {
            name: "request_timeout_secs",
            ..
        })
    ));
}

#[test]
fn overrides_take_precedence() {
    let mut config = Config {
        model: Some("from-file".to_string()),
        request_timeout_secs: Some(10),
        ..Default::default()
    };
    config.apply_overrides(ConfigOverrides {
        model: Some("from-flag".to_string()),
        prompt_file: Some(PathBuf::from("custom.txt")),
        request_timeout_secs: None,
    });

    assert_eq!(config.model(), "from-flag");
    assert_eq!(config.prompt_file(), PathBuf::from("custom.txt"));
    assert_eq!(config.request_timeout_secs, Some(10));
}

#[test]
fn system_instruction_is_trimmed() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let prompt_path = temp_dir.path().join("prompt.txt");
    fs::write(&prompt_path, "\n  Fix my code.  \n").expect("write failed");

    let instruction = load_system_instruction(&prompt_path).expect("read failed");
    assert_eq!(instruction, "Fix my code.");
}

#[test]
fn missing_or_blank_system_instruction_is_fatal() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let missing = load_system_instruction(&temp_dir.path().join("absent.txt"));
    assert!(matches!(missing, Err(ConfigError::SystemInstruction { .. })));

    let blank_path = temp_dir.path().join("blank.txt");
    fs::write(&blank_path, "   \n").expect("write failed");
    assert!(matches!(
        load_system_instruction(&blank_path),
        Err(ConfigError::EmptySystemInstruction)
    ));
}
