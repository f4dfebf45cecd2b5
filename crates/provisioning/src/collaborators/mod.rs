//! Collaborator traits the provisioning saga consumes, with in-memory implementations.

pub mod access;
pub mod cache;

pub use access::{AccessGuard, InMemoryAccessGuard};
pub use cache::{CacheInvalidator, InMemoryCacheInvalidator, TracingCacheInvalidator};
