//! Observability infrastructure for the Vista page rendering orchestrator.
//!
//! This crate provides:
//! - `init` - Global tracing subscriber with env filter and JSON/compact output
//! - `RenderMetrics` - Per-run stage timings, status and byte counts

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export from vista-core for convenience
pub use vista_core::{LogFormat, LoggingConfig, RequestId, TimingContext};
