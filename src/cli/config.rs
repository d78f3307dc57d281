//! `config` subcommand: show (and optionally create) the configuration.

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::cli::startup::{resolve_config, secrets_dir};
use crate::core::config::data::path_display;
use crate::core::config::{Config, ConfigOverrides};
use crate::core::secrets::SecretsFile;

/// Human-readable summary of the settings in effect.
pub fn describe(config: &Config, config_path: &Path) -> String {
    let timeout = config
        .request_timeout_secs
        .map(|secs| format!("{secs}s"))
        .unwrap_or_else(|| "none".to_string());
    let settings = config.generation_settings().ok();

    let mut lines = vec![
        format!("config file:        {}", path_display(config_path)),
        format!(
            "secrets file:       {}",
            path_display(SecretsFile::default_path(&secrets_dir(config_path)))
        ),
        format!("model:              {}", config.model()),
        format!("base_url:           {}", config.base_url()),
    ];
    if let Some(settings) = settings {
        lines.push(format!("temperature:        {}", settings.temperature()));
        lines.push(format!("max_output_tokens:  {}", settings.max_output_tokens()));
    }
    lines.push(format!(
        "prompt_file:        {}",
        path_display(config.prompt_file())
    ));
    lines.push(format!("greeting:           {}", config.greeting()));
    lines.push(format!("request_timeout:    {timeout}"));
    lines.join("\n")
}

pub fn run_config(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    init: bool,
) -> Result<(), Box<dyn Error>> {
    let path = config_path.unwrap_or_else(Config::get_config_path);

    if init {
        if path.exists() {
            eprintln!("⚠️  {} already exists; leaving it unchanged", path_display(&path));
        } else {
            Config::with_defaults().save_to_path(&path)?;
            println!("✅ Wrote defaults to {}", path_display(&path));
        }
    }

    match resolve_config(Some(path.as_path()), overrides) {
        Ok((config, path)) => {
            println!("{}", describe(&config, &path));
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    }
}
