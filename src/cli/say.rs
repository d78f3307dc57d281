//! `say` command: one prompt, one streamed reply, no interactive loop.

use std::error::Error;
use std::path::PathBuf;

use crate::cli::startup::start_session;
use crate::core::config::ConfigOverrides;
use crate::ui::terminal::TerminalSurface;

pub async fn run_say(
    prompt: Vec<String>,
    image_paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    log: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.is_empty() && image_paths.is_empty() {
        eprintln!("Usage: codecorrect say <prompt> [--image <path>]...");
        std::process::exit(1);
    }

    let mut images = Vec::with_capacity(image_paths.len());
    for path in &image_paths {
        match std::fs::read(path) {
            Ok(bytes) => images.push(bytes),
            Err(err) => {
                eprintln!("❌ Error: cannot read {}: {err}", path.display());
                std::process::exit(1);
            }
        }
    }

    let (mut session, _config) = match start_session(config_path, overrides, log) {
        Ok(started) => started,
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    };

    let mut surface = TerminalSurface::stdio().without_user_echo();
    let text = (!prompt.is_empty()).then_some(prompt.as_str());
    let report = session.submit(text, &images, &mut surface).await;

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
