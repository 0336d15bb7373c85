//! Tracing subscriber installation.

use tracing_subscriber::{
    filter::{Directive, ParseError},
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};
use vista_core::{LogFormat, LoggingConfig};

/// Failure installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level '{level}': {message}")]
    InvalidLevel { level: String, message: String },

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Build the env filter: `RUST_LOG` when set, the configured level otherwise.
pub fn env_filter(logging: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    let directive: Directive =
        logging
            .level
            .parse()
            .map_err(|e: ParseError| TelemetryError::InvalidLevel {
                level: logging.level.clone(),
                message: e.to_string(),
            })?;

    Ok(EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy())
}

/// Install a global tracing subscriber using the provided logging settings.
/// Events are written to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init(logging: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = env_filter(logging)?;

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
