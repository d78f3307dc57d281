//! Interactive chat on stdin/stdout.

use std::error::Error;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::startup::start_session;
use crate::core::config::ConfigOverrides;
use crate::ui::surface::ChatSurface;
use crate::ui::terminal::{TerminalSurface, INPUT_PLACEHOLDER};

const CHAT_HELP: &str = "Commands:\n  /image <path>  attach a PNG or JPEG to your next message\n  /help          show this help\n  /quit          leave the chat";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    Attach(PathBuf),
    Help,
    Quit,
    /// A blank line: sends pending attachments, if any.
    Blank,
    Unknown(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        return ChatInput::Blank;
    }

    let Some(command) = trimmed.trim_start().strip_prefix('/') else {
        return ChatInput::Message(trimmed.to_string());
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" | "exit" => ChatInput::Quit,
        "help" => ChatInput::Help,
        "image" if !rest.is_empty() => ChatInput::Attach(PathBuf::from(rest)),
        _ => ChatInput::Unknown(trimmed.to_string()),
    }
}

pub async fn run_chat(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    log: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let (mut session, config) = match start_session(config_path, overrides, log) {
        Ok(started) => started,
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    };

    let mut surface = TerminalSurface::stdio();
    surface.info("👨‍💻 Welcome to Code Correct 🤓")?;
    surface.info(&format!("📡 Using model: {}", config.model()))?;
    surface.info(&format!("💡 {INPUT_PLACEHOLDER}  (/help for commands, Ctrl+D to quit)"))?;
    surface.info("")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_images: Vec<Vec<u8>> = Vec::new();

    loop {
        surface.prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let text = match parse_input(&line) {
            ChatInput::Quit => break,
            ChatInput::Help => {
                surface.info(CHAT_HELP)?;
                continue;
            }
            ChatInput::Unknown(command) => {
                surface.display_error(&format!("Unknown command: {command}"));
                continue;
            }
            ChatInput::Attach(path) => {
                match std::fs::read(&path) {
                    Ok(bytes) => {
                        debug!(path = %path.display(), size = bytes.len(), "queued attachment");
                        pending_images.push(bytes);
                        surface.info(&format!(
                            "📎 {} attached ({} pending)",
                            path.display(),
                            pending_images.len()
                        ))?;
                    }
                    Err(err) => {
                        surface.display_error(&format!("Cannot read {}: {err}", path.display()))
                    }
                }
                continue;
            }
            ChatInput::Blank if pending_images.is_empty() => continue,
            ChatInput::Blank => None,
            ChatInput::Message(text) => Some(text),
        };

        let images = std::mem::take(&mut pending_images);
        session.submit(text.as_deref(), &images, &mut surface).await;
    }

    surface.info("Goodbye!")?;
    Ok(())
}
