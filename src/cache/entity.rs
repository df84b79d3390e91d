//! Memoized entity lookups.

use crate::cache::backend::CacheBackend;
use crate::cache::error::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Caches loaded entities as JSON in a [`CacheBackend`].
///
/// Backend failures are logged and never block a load: a failed read is a
/// miss and a failed write still returns the loaded entity.
#[derive(Debug, Clone)]
pub struct EntityCache {
    backend: Arc<dyn CacheBackend>,
}

impl EntityCache {
    /// Creates a cache over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Returns the cached entity for `key`, calling `loader` on a miss.
    ///
    /// With `force` the cache is bypassed and `loader` always runs. A loaded
    /// entity is stored with expiry `now + ttl`.
    ///
    /// # Errors
    ///
    /// Returns whatever `loader` returns on failure.
    pub async fn ensure<T, F, Fut>(
        &self,
        key: &str,
        loader: F,
        ttl: Duration,
        force: bool,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        if !force {
            match self.backend.get(key).await {
                Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                    Ok(entity) => {
                        tracing::debug!(key, "Entity cache hit");
                        return Ok(entity);
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                    }
                },
                Ok(None) => tracing::debug!(key, "Entity cache miss"),
                Err(e) => tracing::warn!(key, error = %e, "Entity cache read failed"),
            }
        }

        let entity = loader().await?;

        match serde_json::to_vec(&entity) {
            Ok(bytes) => {
                if let Err(e) = self.backend.set(key, bytes, ttl).await {
                    tracing::warn!(key, error = %e, "Entity cache write failed");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "Entity is not serializable"),
        }
        Ok(entity)
    }
}
