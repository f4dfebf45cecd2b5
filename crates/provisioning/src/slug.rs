//! Salon-unique slug resolution.

use catalog::{next_available_slug, slugify};
use catalog_store::{CatalogStore, StoreError};
use common::{SalonId, ServiceId};

/// Returns a slug for `name` that no other service in the salon uses.
///
/// Reads the salon's current slugs and picks the lowest free suffix. Nothing
/// is locked: a concurrent insert can still take the slug first, in which
/// case the store's unique constraint rejects the later insert.
#[tracing::instrument(skip(store))]
pub async fn generate_unique_slug<S>(
    store: &S,
    salon_id: SalonId,
    name: &str,
    exclude_service_id: Option<ServiceId>,
) -> Result<String, StoreError>
where
    S: CatalogStore + ?Sized,
{
    let base = slugify(name);
    let existing = store
        .find_slugs_with_prefix(salon_id, &base, exclude_service_id)
        .await?;

    Ok(next_available_slug(&base, &existing))
}
