//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod auth;
pub mod chat;
pub mod config;
pub mod say;
pub mod startup;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::chat::run_chat;
use crate::cli::config::run_config;
use crate::cli::say::run_say;
use crate::core::config::ConfigOverrides;
use crate::logging::init_tracing;

#[derive(Parser)]
#[command(name = "codecorrect")]
#[command(about = "Code Correct: a terminal chat assistant for fixing and understanding code")]
#[command(
    long_about = "Code Correct sends your questions, code, and screenshots to a Gemini model \
and streams the answer back into the terminal.\n\n\
Authentication:\n\
  The API key is looked up as GEMINI_API_KEY in secrets.toml (config directory),\n\
  then the system keyring ('codecorrect auth'), then the environment.\n\n\
System instruction:\n\
  Read once at startup from prompt.txt in the working directory, or from\n\
  --prompt-file / the prompt_file config setting.\n\n\
Chat commands:\n\
  /image <path>     Attach a PNG or JPEG to the next message\n\
  /help             Show chat commands\n\
  /quit             Leave the chat (Ctrl+D also works)\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    API key (fallback)\n\
  CODECORRECT_LOG   Diagnostic log filter, e.g. 'debug' (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file to use instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model to use for chat
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// File holding the system instruction
    #[arg(long, global = true, value_name = "PATH")]
    pub prompt_file: Option<PathBuf>,

    /// Abandon a reply after this many seconds
    #[arg(short = 't', long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Append the conversation to a file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            prompt_file: self.prompt_file.clone(),
            request_timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Ask a single question and print the answer
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
        /// Attach a PNG or JPEG (repeatable)
        #[arg(short = 'i', long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Store the API key in the system keyring
    Auth,
    /// Remove the API key from the system keyring
    Deauth,
    /// Show the resolved configuration
    Config {
        /// Write a config file with every default filled in
        #[arg(long)]
        init: bool,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing();

    let overrides = args.overrides();
    match args.command {
        None | Some(Commands::Chat) => run_chat(args.config, overrides, args.log).await,
        Some(Commands::Say { prompt, images }) => {
            run_say(prompt, images, args.config, overrides, args.log).await
        }
        Some(Commands::Auth) => run_auth(),
        Some(Commands::Deauth) => run_deauth(),
        Some(Commands::Config { init }) => run_config(args.config, overrides, init),
    }
}
