//! Observability.
//!
//! Library code only emits `tracing` events and `metrics` samples; the
//! binary decides where they go.

mod logging;

pub use logging::{LOG_FORMAT_ENV, LogFormat, LoggingConfig};

use crate::{Error, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global `tracing` subscriber (stderr output).
///
/// # Errors
///
/// Returns [`Error::ConfigurationFailure`] if a global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.filter);
    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init(),
    }
    .map_err(init_error)
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::configuration("observability_init", e)
}
