//! Compensating deletes for a partially provisioned service.

use catalog_store::CatalogStore;
use common::ServiceId;

use crate::error::CompensationFailure;

/// Removes the rows a failed provisioning run already wrote.
///
/// With `include_pricing`, the pricing row is deleted first; if that fails
/// the service delete is not attempted. Failures are logged and counted but
/// never retried.
#[tracing::instrument(skip(store))]
pub async fn rollback<S>(
    store: &S,
    service_id: ServiceId,
    include_pricing: bool,
) -> Result<(), CompensationFailure>
where
    S: CatalogStore + ?Sized,
{
    metrics::counter!("provisioning_rollbacks_total").increment(1);

    if include_pricing && let Err(source) = store.delete_pricing(service_id).await {
        let failure = CompensationFailure::PricingDelete { service_id, source };
        report(&failure);
        return Err(failure);
    }

    if let Err(source) = store.delete_service(service_id).await {
        let failure = CompensationFailure::ServiceDelete {
            service_id,
            pricing_deleted: include_pricing,
            source,
        };
        report(&failure);
        return Err(failure);
    }

    tracing::info!(%service_id, include_pricing, "rollback completed");
    Ok(())
}

fn report(failure: &CompensationFailure) {
    metrics::counter!("provisioning_compensation_failures_total").increment(1);
    tracing::error!(
        service_id = %failure.service_id(),
        step = %failure.step(),
        pricing_deleted = failure.pricing_deleted(),
        error = %failure,
        "rollback failed; manual cleanup required"
    );
}
