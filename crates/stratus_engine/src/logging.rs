//! Tracing subscriber setup for hosts embedding the engine.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, LogFormat};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. Returns `false` when a
/// subscriber was already installed, in which case nothing changes.
pub fn init_logging(config: &EngineConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_current_span(false))
            .with(filter)
            .try_init(),
    };

    result.is_ok()
}
