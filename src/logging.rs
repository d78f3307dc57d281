//! Diagnostic logging.
//!
//! Output goes to stderr so it never mixes with a streamed reply. The filter
//! comes from `CODECORRECT_LOG` (same syntax as `RUST_LOG`) and defaults to
//! warnings only.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

pub const LOG_ENV: &str = "CODECORRECT_LOG";

pub fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing() {
    let stderr_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);
    let subscriber = Registry::default().with(filter_from_env()).with(stderr_log);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
