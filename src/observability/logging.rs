use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::error::{RecoError, RecoResult};

/// Initialize the global tracing subscriber.
///
/// The level filter comes from the configured log level; `RUST_LOG` takes
/// precedence when set. JSON output is used unless `log_format` is "text".
pub fn init_logging(config: &ObservabilityConfig) -> RecoResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| RecoError::Config(format!("Invalid log level filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.log_format == "text" {
        builder.try_init()
    } else {
        builder.json().try_init()
    };

    result.map_err(|e| RecoError::Internal(format!("Failed to initialize logging: {}", e)))
}
