use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use crate::core::gateway::GenerationSettings;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_PROMPT_FILE: &str = "prompt.txt";
pub const DEFAULT_GREETING: &str = "Hello! How can I help you with your code today?";

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn prompt_file(&self) -> PathBuf {
        self.prompt_file
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_PROMPT_FILE).to_path_buf())
    }

    pub fn greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn generation_settings(&self) -> Result<GenerationSettings, ConfigError> {
        GenerationSettings::new(
            self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        )
        .map_err(|err| ConfigError::InvalidSetting {
            name: "generation",
            reason: err.reason(),
        })
    }

    /// Checks every setting that can be wrong without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation_settings()?;
        if self.model().trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// A config with every default written out, used by `config --init`.
    pub fn with_defaults() -> Self {
        Config {
            model: Some(DEFAULT_MODEL.to_string()),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_output_tokens: Some(DEFAULT_MAX_OUTPUT_TOKENS),
            prompt_file: Some(PathBuf::from(DEFAULT_PROMPT_FILE)),
            greeting: Some(DEFAULT_GREETING.to_string()),
            request_timeout_secs: None,
        }
    }
}
