//! Error types for the pond engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and actor execution.

/// Top-level error for the pond engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: shoal_core::config::ConfigError,
    },

    /// Simulation clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: shoal_core::clock::ClockError,
    },

    /// The Dragonfly mirror could not be reached at startup.
    #[error("db error: {source}")]
    Db {
        /// The underlying data-layer error.
        #[from]
        source: shoal_db::DbError,
    },

    /// Metric series construction failed.
    #[error("metrics error: {source}")]
    Metrics {
        /// The underlying metrics error.
        #[from]
        source: shoal_metrics::MetricsError,
    },

    /// The pond actor failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: shoal_core::runner::RunnerError,
    },

    /// NATS connection or messaging failed.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: crate::transport::TransportError,
    },

    /// The control HTTP server failed to start.
    #[error("control error: {source}")]
    Control {
        /// The underlying control-surface error.
        #[from]
        source: crate::control::ControlError,
    },
}
