/// Observability module
///
/// Process-global Prometheus metrics (registered exactly once, on first use)
/// and tracing-based structured logging.
pub mod logging;
pub mod metrics;


pub use logging::init_logging;
pub use metrics::Metrics;
