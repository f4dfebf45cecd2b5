//! Listing cache invalidation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::CacheError;

/// Drops cached pages or query results under a key.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

/// Invalidator for deployments without a shared cache: it only logs the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCacheInvalidator;

#[async_trait]
impl CacheInvalidator for TracingCacheInvalidator {
    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        tracing::debug!(key, "cache invalidated");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryCacheState {
    invalidated: Vec<String>,
    fail_on_invalidate: bool,
}

/// In-memory cache invalidator that records the keys it was given.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheInvalidator {
    state: Arc<RwLock<InMemoryCacheState>>,
}

impl InMemoryCacheInvalidator {
    /// Creates a new in-memory cache invalidator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every invalidation to fail.
    pub fn set_fail_on_invalidate(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_invalidate = fail;
    }

    /// Returns the keys invalidated so far, in order.
    pub fn invalidated(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidated
            .clone()
    }
}

#[async_trait]
impl CacheInvalidator for InMemoryCacheInvalidator {
    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_invalidate {
            return Err(CacheError {
                key: key.to_string(),
                reason: "cache unavailable".to_string(),
            });
        }

        state.invalidated.push(key.to_string());
        Ok(())
    }
}
