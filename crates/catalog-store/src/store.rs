use async_trait::async_trait;
use catalog::{NewService, NewServiceBookingRules, NewServicePricing};
use common::{SalonId, ServiceId};

use crate::Result;

/// Single-row primitives over the catalog tables.
///
/// Implementations enforce the same constraints a relational schema would:
/// `(salon_id, slug)` is unique, pricing requires its service, booking rules
/// require both service and pricing, and a service cannot be deleted while
/// child rows still reference it. All implementations must be thread-safe.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a service definition and returns the id assigned to it.
    async fn insert_service(&self, service: NewService) -> Result<ServiceId>;

    /// Inserts the pricing row of an existing service.
    async fn insert_pricing(&self, pricing: NewServicePricing) -> Result<()>;

    /// Inserts the booking rules row of a service that already has pricing.
    async fn insert_booking_rules(&self, rules: NewServiceBookingRules) -> Result<()>;

    /// Deletes the pricing row of a service. Deleting a missing row succeeds.
    async fn delete_pricing(&self, service_id: ServiceId) -> Result<()>;

    /// Deletes a service definition. Deleting a missing row succeeds.
    async fn delete_service(&self, service_id: ServiceId) -> Result<()>;

    /// Lists slugs in the salon starting with `prefix`, ignoring case.
    ///
    /// `exclude` leaves out one service, so renaming a service does not
    /// collide with its own current slug.
    async fn find_slugs_with_prefix(
        &self,
        salon_id: SalonId,
        prefix: &str,
        exclude: Option<ServiceId>,
    ) -> Result<Vec<String>>;
}
