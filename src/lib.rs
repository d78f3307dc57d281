//! Code Correct is a terminal chat client that streams code help from a
//! hosted Gemini model.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the transcript, the translation into API requests, the
//!   streamed-reply handling, configuration, and credential lookup.
//! - [`ui`] defines the chat surface the session renders to, plus a terminal
//!   implementation.
//! - [`api`] defines the request/response payloads of the generation API.
//! - [`cli`] parses arguments and runs the `chat`, `say`, `auth`, `deauth`,
//!   and `config` commands.
//!
//! The binary (`src/main.rs`) routes straight into [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
