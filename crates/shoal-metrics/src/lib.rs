//! Prometheus counter/gauge sink for the Shoal simulation.
//!
//! Holds the five series every pond exports and renders them in the
//! Prometheus text exposition format for the engine's scrape endpoint:
//!
//! | Series | Type | Meaning |
//! |--------|------|---------|
//! | `fish_spawned_total` | counter | Total number of fish spawned |
//! | `fish_removed_total` | counter | Total number of fish removed |
//! | `active_fish` | gauge | Current number of active fish in the pond |
//! | `fish_local` | gauge | Number of local fish |
//! | `fish_visitors` | gauge | Number of visitor fish |
//!
//! The sink is a best-effort mirror: the lifecycle manager moves the
//! relevant series on each transition and never reads them back.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use shoal_core::adapters::MetricsSink;

/// Errors that can occur when building or rendering the registry.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Series registration or rendering failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The rendered exposition was not valid UTF-8.
    #[error("metrics exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// The pond's metric series, backed by a private Prometheus registry.
#[derive(Debug, Clone)]
pub struct PondGauges {
    registry: Registry,
    spawned: IntCounter,
    removed: IntCounter,
    active: IntGauge,
    local: IntGauge,
    visitor: IntGauge,
}

impl PondGauges {
    /// Build the five series and register them.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Prometheus`] if any series fails to
    /// construct or register (duplicate names cannot occur here, so
    /// this is effectively infallible).
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let spawned = IntCounter::new("fish_spawned_total", "Total number of fish spawned")?;
        let removed = IntCounter::new("fish_removed_total", "Total number of fish removed")?;
        let active = IntGauge::new("active_fish", "Current number of active fish in the pond")?;
        let local = IntGauge::new("fish_local", "Number of local fish")?;
        let visitor = IntGauge::new("fish_visitors", "Number of visitor fish")?;

        registry.register(Box::new(spawned.clone()))?;
        registry.register(Box::new(removed.clone()))?;
        registry.register(Box::new(active.clone()))?;
        registry.register(Box::new(local.clone()))?;
        registry.register(Box::new(visitor.clone()))?;

        Ok(Self {
            registry,
            spawned,
            removed,
            active,
            local,
            visitor,
        })
    }

    /// Render all series in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if encoding fails.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// The underlying registry, for embedding into a larger exporter.
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsSink for PondGauges {
    fn spawned_inc(&self) {
        self.spawned.inc();
    }

    fn removed_inc(&self) {
        self.removed.inc();
    }

    fn active_inc(&self) {
        self.active.inc();
    }

    fn active_dec(&self) {
        self.active.dec();
    }

    fn local_inc(&self) {
        self.local.inc();
    }

    fn local_dec(&self) {
        self.local.dec();
    }

    fn visitor_inc(&self) {
        self.visitor.inc();
    }

    fn visitor_dec(&self) {
        self.visitor.dec();
    }
}
