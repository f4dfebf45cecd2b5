use common::{SalonId, ServiceId};
use thiserror::Error;

/// Errors returned by catalog store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another service in the salon already uses this slug.
    #[error("Slug '{slug}' is already used by another service in salon {salon_id}")]
    SlugTaken { salon_id: SalonId, slug: String },

    /// A child row referenced a service (or pricing) row that does not exist.
    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// A one-to-one child row already exists for the service.
    #[error("A {table} row already exists for service {service_id}")]
    AlreadyExists {
        table: &'static str,
        service_id: ServiceId,
    },

    /// The service still has pricing or booking rules attached.
    #[error("Service {0} still has dependent rows")]
    HasDependents(ServiceId),

    /// A value does not fit the column type.
    #[error("Value out of range for column {column}")]
    OutOfRange { column: &'static str },

    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true for the unique `(salon_id, slug)` violation, which a
    /// caller may resolve by regenerating the slug and retrying.
    pub fn is_slug_conflict(&self) -> bool {
        matches!(self, StoreError::SlugTaken { .. })
    }
}

/// Result type for catalog store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
