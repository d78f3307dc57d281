//! Resolution of the API key.
//!
//! Sources are tried in order: a `secrets.toml` file in the config
//! directory, the system keyring, then the process environment. The first
//! non-blank value wins.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::config::ConfigError;
use crate::core::keyring::read_secret;

/// Name under which the Gemini API key is looked up in every source.
pub const API_KEY_NAME: &str = "GEMINI_API_KEY";

pub trait SecretProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads secrets from environment variables.
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Reads secrets from the platform keyring. Backend failures are logged and
/// treated as a missing entry so the next source can be tried.
pub struct KeyringSecrets;

impl SecretProvider for KeyringSecrets {
    fn get(&self, key: &str) -> Option<String> {
        match read_secret(key) {
            Ok(value) => value,
            Err(err) => {
                debug!(key, recoverable = err.is_recoverable(), "keyring lookup failed: {err}");
                None
            }
        }
    }
}

/// A TOML table of `NAME = "value"` pairs. Entries that are not strings,
/// such as flags or nested tables, are ignored.
#[derive(Debug, Default)]
pub struct SecretsFile {
    values: toml::Table,
}

impl SecretsFile {
    pub fn default_path(config_dir: &Path) -> PathBuf {
        config_dir.join("secrets.toml")
    }

    /// A missing file is an empty table; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let values = toml::from_str::<toml::Table>(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { values })
    }
}

impl SecretProvider for SecretsFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    }
}

#[derive(Default)]
pub struct ChainedSecrets {
    providers: Vec<Box<dyn SecretProvider>>,
}

impl ChainedSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// File, keyring, then environment.
    pub fn standard(config_dir: &Path) -> Result<Self, ConfigError> {
        let file = SecretsFile::load(&SecretsFile::default_path(config_dir))?;
        Ok(Self::new().with(file).with(KeyringSecrets).with(EnvSecrets))
    }
}

impl SecretProvider for ChainedSecrets {
    fn get(&self, key: &str) -> Option<String> {
        self.providers
            .iter()
            .filter_map(|provider| provider.get(key))
            .find(|value| !value.trim().is_empty())
    }
}

pub fn require_api_key(secrets: &dyn SecretProvider) -> Result<String, ConfigError> {
    secrets
        .get(API_KEY_NAME)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential {
            key: API_KEY_NAME.to_string(),
        })
}
