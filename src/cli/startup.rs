//! Everything that has to succeed before the first turn: configuration,
//! credential, system instruction, and the session built from them.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::config::{load_system_instruction, Config, ConfigError, ConfigOverrides};
use crate::core::gateway::GeminiGateway;
use crate::core::secrets::{require_api_key, ChainedSecrets, SecretProvider};
use crate::core::session::ChatSession;
use crate::core::transcript::Transcript;
use crate::utils::logging::TranscriptLog;

/// Loads the config file (default location unless `config_path` is given)
/// and applies command-line overrides.
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<(Config, PathBuf), ConfigError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::get_config_path);
    let mut config = Config::load_from_path(&path)?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok((config, path))
}

/// Directory holding `secrets.toml`: next to the config file in use.
pub fn secrets_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_dir)
}

pub fn build_session(
    config: &Config,
    secrets: &dyn SecretProvider,
    log: Option<TranscriptLog>,
) -> Result<ChatSession, ConfigError> {
    let api_key = require_api_key(secrets)?;
    let instruction = load_system_instruction(&config.prompt_file())?;
    let transcript = Transcript::initialize_with_greeting(&instruction, config.greeting())?;

    let gateway = GeminiGateway::new(config.base_url(), api_key, config.model())
        .with_timeout(config.request_timeout());
    info!(model = %gateway.model(), "session ready");

    Ok(ChatSession::new(transcript, Box::new(gateway), config.generation_settings()?).with_log(log))
}

/// Startup as the binary does it. Any error here is fatal.
pub fn start_session(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    log_path: Option<PathBuf>,
) -> Result<(ChatSession, Config), Box<dyn std::error::Error>> {
    let (config, path) = resolve_config(config_path.as_deref(), overrides)?;
    let secrets = ChainedSecrets::standard(&secrets_dir(&path))?;
    let log = log_path.map(TranscriptLog::new).transpose()?;
    let session = build_session(&config, &secrets, log)?;
    Ok((session, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::secrets::API_KEY_NAME;
    use std::fs;
    use tempfile::TempDir;

    struct OneKey(&'static str);

    impl SecretProvider for OneKey {
        fn get(&self, key: &str) -> Option<String> {
            (key == API_KEY_NAME).then(|| self.0.to_string())
        }
    }

    struct NoKeys;

    impl SecretProvider for NoKeys {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
    }

    fn config_with_prompt(dir: &TempDir, prompt: &str) -> Config {
        let prompt_path = dir.path().join("prompt.txt");
        fs::write(&prompt_path, prompt).expect("write prompt");
        Config {
            prompt_file: Some(prompt_path),
            greeting: Some("Hi there.".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn session_starts_with_seed_turns() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_with_prompt(&dir, "Fix my code.\n");

        let session = build_session(&config, &OneKey("k"), None).expect("session builds");
        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text(), "Fix my code.");
        assert_eq!(turns[1].text(), "Hi there.");
        assert!(session.transcript().visible_turns().is_empty());
    }

    #[test]
    fn missing_key_stops_startup() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_with_prompt(&dir, "Fix my code.");
        assert!(matches!(
            build_session(&config, &NoKeys, None),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn missing_prompt_file_stops_startup() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            prompt_file: Some(dir.path().join("absent.txt")),
            ..Default::default()
        };
        assert!(matches!(
            build_session(&config, &OneKey("k"), None),
            Err(ConfigError::SystemInstruction { .. })
        ));
    }

    #[test]
    fn resolve_config_applies_overrides_and_validates() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = \"gemini-1.5-flash\"\ntemperature = 0.3\n").expect("write");

        let (config, resolved_path) = resolve_config(
            Some(path.as_path()),
            ConfigOverrides {
                model: Some("gemini-1.5-pro".to_string()),
                ..Default::default()
            },
        )
        .expect("valid config");
        assert_eq!(config.model(), "gemini-1.5-pro");
        assert_eq!(resolved_path, path);
        assert_eq!(secrets_dir(&resolved_path), dir.path());

        fs::write(&path, "temperature = 3.0\n").expect("write");
        assert!(matches!(
            resolve_config(Some(path.as_path()), ConfigOverrides::default()),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }
}
