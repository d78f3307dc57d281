use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration. Every field is optional; see `defaults.rs` for the
/// values used when a field is absent.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Gemini model identifier (e.g., "gemini-1.5-flash")
    pub model: Option<String>,
    /// API root, without the `/models/...` suffix
    pub base_url: Option<String>,
    /// Sampling temperature in [0, 1]
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// File holding the system instruction sent as the first turn
    pub prompt_file: Option<PathBuf>,
    /// Seed reply that follows the system instruction
    pub greeting: Option<String>,
    /// Give up on a reply after this many seconds
    pub request_timeout_secs: Option<u64>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/codecorrect/config.toml` → `~/.config/codecorrect/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub prompt_file: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(model) = overrides.model {
            self.model = Some(model);
        }
        if let Some(prompt_file) = overrides.prompt_file {
            self.prompt_file = Some(prompt_file);
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs = Some(timeout);
        }
    }
}
