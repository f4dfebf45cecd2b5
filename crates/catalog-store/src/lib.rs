//! Storage for the three catalog tables written by service provisioning.
//!
//! The store exposes single-row inserts and deletes only. Callers that need
//! several rows to appear together must compensate themselves.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalogStore, StoreOperation};
pub use postgres::PostgresCatalogStore;
pub use store::CatalogStore;
