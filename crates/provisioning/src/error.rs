//! Provisioning error types.

use catalog::ValidationError;
use catalog_store::StoreError;
use common::{SalonId, ServiceId};
use thiserror::Error;

use crate::service_creation::ProvisioningStep;

/// The caller could not be identified or may not manage the salon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// No authenticated caller.
    #[error("You must be logged in to create a service")]
    NotAuthenticated,

    /// The caller has no access to the salon.
    #[error("Unauthorized: You do not have access to salon {salon_id}")]
    Forbidden { salon_id: SalonId },

    /// The identity or access service could not answer.
    #[error("Access check unavailable: {0}")]
    Unavailable(String),
}

/// A listing cache could not be invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cache invalidation failed for '{key}': {reason}")]
pub struct CacheError {
    pub key: String,
    pub reason: String,
}

/// A compensating delete failed, leaving rows that need manual cleanup.
#[derive(Debug, Error)]
pub enum CompensationFailure {
    /// Deleting the pricing row failed; the service delete was not attempted,
    /// so the service and pricing rows (and possibly booking rules) remain.
    #[error(
        "Could not delete pricing for service {service_id}; service row left in place: {source}"
    )]
    PricingDelete {
        service_id: ServiceId,
        source: StoreError,
    },

    /// Deleting the service row failed.
    #[error("Could not delete service {service_id}{}: {source}", pricing_note(.pricing_deleted))]
    ServiceDelete {
        service_id: ServiceId,
        pricing_deleted: bool,
        source: StoreError,
    },
}

fn pricing_note(pricing_deleted: &bool) -> &'static str {
    if *pricing_deleted {
        "; its pricing row was already deleted"
    } else {
        ""
    }
}

impl CompensationFailure {
    /// The service whose rows could not be removed.
    pub fn service_id(&self) -> ServiceId {
        match self {
            CompensationFailure::PricingDelete { service_id, .. }
            | CompensationFailure::ServiceDelete { service_id, .. } => *service_id,
        }
    }

    /// The compensating step that failed.
    pub fn step(&self) -> ProvisioningStep {
        match self {
            CompensationFailure::PricingDelete { .. } => ProvisioningStep::Pricing,
            CompensationFailure::ServiceDelete { .. } => ProvisioningStep::Service,
        }
    }

    /// True when the pricing row is known to be gone.
    pub fn pricing_deleted(&self) -> bool {
        match self {
            CompensationFailure::PricingDelete { .. } => false,
            CompensationFailure::ServiceDelete {
                pricing_deleted, ..
            } => *pricing_deleted,
        }
    }
}

/// Errors returned by service provisioning.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// A payload broke a schema rule, or the category is missing.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The caller may not create services in the salon.
    #[error("{0}")]
    Authorization(#[from] AuthorizationError),

    /// A store call failed during a forward step. Rows written before it
    /// have been removed.
    #[error("Failed to create {step}: {source}")]
    DataStore {
        step: ProvisioningStep,
        source: StoreError,
    },

    /// Rolling back after a failed step failed as well.
    #[error("{failure} (after: {original})")]
    Compensation {
        original: Box<ProvisioningError>,
        #[source]
        failure: CompensationFailure,
    },
}

impl ProvisioningError {
    pub(crate) fn data_store(step: ProvisioningStep, source: StoreError) -> Self {
        ProvisioningError::DataStore { step, source }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisioningError::Validation(_) => "validation",
            ProvisioningError::Authorization(_) => "authorization",
            ProvisioningError::DataStore { .. } => "data_store",
            ProvisioningError::Compensation { .. } => "compensation",
        }
    }

    /// The forward step that failed, for store and compensation errors.
    pub fn step(&self) -> Option<ProvisioningStep> {
        match self {
            ProvisioningError::DataStore { step, .. } => Some(*step),
            ProvisioningError::Compensation { original, .. } => original.step(),
            _ => None,
        }
    }

    /// True when the service insert lost a race for its slug. Provisioning
    /// again computes a fresh slug.
    pub fn is_slug_conflict(&self) -> bool {
        matches!(
            self,
            ProvisioningError::DataStore {
                step: ProvisioningStep::Service,
                source,
            } if source.is_slug_conflict()
        )
    }
}

/// Convenience type alias for provisioning results.
pub type Result<T> = std::result::Result<T, ProvisioningError>;
