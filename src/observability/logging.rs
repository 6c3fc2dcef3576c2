//! Structured logging configuration.

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "SQLKV_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything other than `json` is [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Builds logging configuration from `RUST_LOG` and [`LOG_FORMAT_ENV`].
    ///
    /// Without `RUST_LOG` the level is `warn`, or `debug` for this crate when
    /// `verbose` is set.
    #[must_use]
    pub fn from_env(verbose: bool) -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        Self {
            filter: EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
            format,
        }
    }
}

const fn default_directive(verbose: bool) -> &'static str {
    if verbose { "warn,sqlkv=debug" } else { "warn" }
}
