//! Structured logging and metrics for the controller manager and host agent.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::Metrics;
pub use spans::{ReconcileSpan, SpanExt};
