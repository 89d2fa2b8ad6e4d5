//! Logging setup for the binaries using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from the `ROADMAP_LOG` environment variable using the
//! usual `EnvFilter` directive syntax (e.g. `debug`,
//! `roadmap_engine::slot=debug`), defaulting to `info`. Output goes to
//! stderr so the REPL's stdout stays clean.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ROADMAP_LOG";

pub type LoggingError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging() -> Result<(), LoggingError> {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
}

fn build_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
