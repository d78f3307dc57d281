use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Startup failures. None of these are retried: the caller reports the error
/// and exits.
#[derive(Debug)]
pub enum ConfigError {
    /// No API key was found in any secret source.
    MissingCredential {
        /// Name of the secret that was looked up.
        key: String,
    },

    /// The system-instruction file could not be read.
    SystemInstruction {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The system instruction was present but blank.
    EmptySystemInstruction,

    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },

    /// A setting parsed but holds an unusable value.
    InvalidSetting { name: &'static str, reason: String },
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredential { key } => write!(
                f,
                "{key} not found. Run `codecorrect auth`, add it to secrets.toml, or export it as an environment variable."
            ),
            ConfigError::SystemInstruction { path, source } => write!(
                f,
                "Failed to read system instruction at {}: {}",
                Self::display_path(path),
                source
            ),
            ConfigError::EmptySystemInstruction => {
                write!(f, "The system instruction is empty")
            }
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::InvalidSetting { name, reason } => {
                write!(f, "Invalid setting `{name}`: {reason}")
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::SystemInstruction { source, .. } => Some(source),
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Config {
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.to_path_buf(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        match ProjectDirs::from("org", "codecorrect", "codecorrect") {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => PathBuf::from(".codecorrect"),
        }
    }

    pub fn get_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Read the system instruction once at startup. Surrounding whitespace is
/// trimmed; a blank file is an error.
pub fn load_system_instruction(path: &Path) -> Result<String, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::SystemInstruction {
        path: path.to_path_buf(),
        source,
    })?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptySystemInstruction);
    }
    Ok(trimmed.to_string())
}
