//! `Dragonfly` (Redis-compatible) fish record operations.
//!
//! The pond writes one JSON record per held fish at `fish:{id}` and
//! deletes it when the fish is reaped or released. Reads exist for
//! peer tooling and tests; the simulation itself never reads back.

use async_trait::async_trait;
use fred::prelude::*;
use shoal_core::adapters::{FishStore, StoreError};
use shoal_types::{FishId, FishRecord};

use crate::error::DbError;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`] and provides typed operations for
/// the `fish:{id}` key pattern.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// The storage key for one fish.
    fn fish_key(id: &FishId) -> String {
        format!("fish:{id}")
    }

    /// Serialize `record` as JSON and store it at `fish:{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn put_fish(&self, record: &FishRecord) -> Result<(), DbError> {
        let key = Self::fish_key(&record.name);
        let json = serde_json::to_string(record)?;
        let _: () = self.client.set(key, json.as_str(), None, None, false).await?;
        Ok(())
    }

    /// Read back the record at `fish:{id}`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_fish(&self, id: &FishId) -> Result<Option<FishRecord>, DbError> {
        let value: Option<String> = self.client.get(Self::fish_key(id)).await?;
        value
            .map(|s| serde_json::from_str(&s).map_err(DbError::from))
            .transpose()
    }

    /// Delete the record at `fish:{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete_fish(&self, id: &FishId) -> Result<(), DbError> {
        let _: u32 = self.client.del(Self::fish_key(id)).await?;
        Ok(())
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for DragonflyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragonflyStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl FishStore for DragonflyStore {
    async fn store(&self, record: &FishRecord) -> Result<(), StoreError> {
        self.put_fish(record)
            .await
            .map_err(|e| StoreError::new(e.to_string()))
    }

    async fn delete(&self, id: &FishId) -> Result<(), StoreError> {
        self.delete_fish(id)
            .await
            .map_err(|e| StoreError::new(e.to_string()))
    }

    async fn fetch(&self, id: &FishId) -> Result<Option<FishRecord>, StoreError> {
        self.get_fish(id)
            .await
            .map_err(|e| StoreError::new(e.to_string()))
    }
}
