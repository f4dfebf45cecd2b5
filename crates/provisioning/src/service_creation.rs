//! Service creation saga constants.

use common::SalonId;
use serde::{Deserialize, Serialize};

/// The saga type identifier for service creation.
pub const SAGA_TYPE: &str = "ServiceCreation";

/// A forward step of the service creation saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    /// Insert the service definition (and resolve its slug beforehand).
    Service,
    /// Insert the pricing row.
    Pricing,
    /// Insert the booking rules row.
    BookingRules,
}

impl ProvisioningStep {
    /// Returns the step name as used in logs and error reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStep::Service => "service",
            ProvisioningStep::Pricing => "pricing",
            ProvisioningStep::BookingRules => "booking_rules",
        }
    }
}

impl std::fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cache key of a salon's service listing, invalidated after a service is created.
pub fn listing_cache_key(salon_id: SalonId) -> String {
    format!("/salons/{salon_id}/services")
}
