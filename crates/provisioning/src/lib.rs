//! Service provisioning saga.
//!
//! Creating a sellable service writes three rows in three separate store
//! calls. This crate orchestrates those calls as a saga:
//! 1. Insert the service definition
//! 2. Insert its pricing
//! 3. Insert its booking rules
//!
//! If step 2 or 3 fails, the rows already written are deleted in reverse
//! order before the error is returned.

pub mod collaborators;
pub mod coordinator;
pub mod error;
pub mod rollback;
pub mod service_creation;
pub mod slug;
pub mod state;

pub use collaborators::{
    AccessGuard, CacheInvalidator, InMemoryAccessGuard, InMemoryCacheInvalidator,
    TracingCacheInvalidator,
};
pub use coordinator::{CreateServiceOptions, CreatedService, ServiceProvisioner};
pub use error::{AuthorizationError, CacheError, CompensationFailure, ProvisioningError, Result};
pub use rollback::rollback;
pub use service_creation::ProvisioningStep;
pub use slug::generate_unique_slug;
pub use state::ProvisioningState;
