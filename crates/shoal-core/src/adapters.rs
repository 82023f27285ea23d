//! Seams to the external persistence and metrics collaborators.
//!
//! The lifecycle manager invokes these on every state transition.
//! Both adapters are best-effort mirrors of the in-memory collection:
//! a failed call is logged by the caller and never rolls back the
//! transition, because the in-memory simulation state is the source of
//! truth.

use async_trait::async_trait;
use shoal_types::{FishId, FishRecord};

/// Error reported by a persistence adapter operation.
#[derive(Debug, thiserror::Error)]
#[error("store error: {message}")]
pub struct StoreError {
    /// Description of the failure.
    pub message: String,
}

impl StoreError {
    /// Wrap a failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External key-value mirror of the fish collection.
///
/// Implementations persist one record per fish under `fish:{id}` and
/// remove it when the fish leaves the collection (reaped or released).
#[async_trait]
pub trait FishStore: Send + Sync {
    /// Persist (or overwrite) the record for one fish.
    async fn store(&self, record: &FishRecord) -> Result<(), StoreError>;

    /// Remove the persisted record for one fish.
    async fn delete(&self, id: &FishId) -> Result<(), StoreError>;

    /// Read back the persisted record for one fish, if present.
    async fn fetch(&self, id: &FishId) -> Result<Option<FishRecord>, StoreError>;
}

/// External counter/gauge sink.
///
/// One method per series movement, so the lifecycle manager controls
/// exactly which series each transition touches and in what order.
/// All operations are infallible by construction.
pub trait MetricsSink: Send + Sync {
    /// Increment the spawned-total counter.
    fn spawned_inc(&self);

    /// Increment the removed-total counter.
    fn removed_inc(&self);

    /// Increment the active-fish gauge.
    fn active_inc(&self);

    /// Decrement the active-fish gauge.
    fn active_dec(&self);

    /// Increment the local-fish gauge.
    fn local_inc(&self);

    /// Decrement the local-fish gauge.
    fn local_dec(&self);

    /// Increment the visitor-fish gauge.
    fn visitor_inc(&self);

    /// Decrement the visitor-fish gauge.
    fn visitor_dec(&self);
}

/// A store that keeps nothing. Useful in tests and degraded setups.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

#[async_trait]
impl FishStore for NullStore {
    async fn store(&self, _record: &FishRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete(&self, _id: &FishId) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fetch(&self, _id: &FishId) -> Result<Option<FishRecord>, StoreError> {
        Ok(None)
    }
}

/// A sink that drops every observation. Useful in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn spawned_inc(&self) {}
    fn removed_inc(&self) {}
    fn active_inc(&self) {}
    fn active_dec(&self) {}
    fn local_inc(&self) {}
    fn local_dec(&self) {}
    fn visitor_inc(&self) {}
    fn visitor_dec(&self) {}
}
