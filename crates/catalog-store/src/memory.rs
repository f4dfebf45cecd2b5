use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use catalog::{NewService, NewServiceBookingRules, NewServicePricing};
use common::{SalonId, ServiceId};

use crate::{CatalogStore, Result, StoreError};

/// Store primitives, used to inject failures and to inspect call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    InsertService,
    InsertPricing,
    InsertBookingRules,
    DeletePricing,
    DeleteService,
    FindSlugs,
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    services: HashMap<ServiceId, NewService>,
    pricing: HashMap<ServiceId, NewServicePricing>,
    booking_rules: HashMap<ServiceId, NewServiceBookingRules>,
    failures: HashSet<StoreOperation>,
    operations: Vec<StoreOperation>,
}

impl InMemoryCatalogState {
    fn begin(&mut self, operation: StoreOperation) -> Result<()> {
        self.operations.push(operation);
        if self.failures.contains(&operation) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on {operation:?}"
            )));
        }
        Ok(())
    }
}

/// In-memory catalog store for tests and local runs.
///
/// Enforces the same uniqueness and reference rules as the PostgreSQL schema
/// and records every primitive it is asked to run.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalogStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryCatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryCatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent call of `operation` fail (or succeed again).
    pub fn set_fail_on(&self, operation: StoreOperation, fail: bool) {
        let mut state = self.write();
        if fail {
            state.failures.insert(operation);
        } else {
            state.failures.remove(&operation);
        }
    }

    /// Every primitive attempted so far, in call order, including failed ones.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.read().operations.clone()
    }

    /// Number of insert attempts, successful or not.
    pub fn insert_attempts(&self) -> usize {
        self.read()
            .operations
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    StoreOperation::InsertService
                        | StoreOperation::InsertPricing
                        | StoreOperation::InsertBookingRules
                )
            })
            .count()
    }

    pub fn service_count(&self) -> usize {
        self.read().services.len()
    }

    pub fn pricing_count(&self) -> usize {
        self.read().pricing.len()
    }

    pub fn booking_rules_count(&self) -> usize {
        self.read().booking_rules.len()
    }

    pub fn service(&self, service_id: ServiceId) -> Option<NewService> {
        self.read().services.get(&service_id).cloned()
    }

    pub fn pricing(&self, service_id: ServiceId) -> Option<NewServicePricing> {
        self.read().pricing.get(&service_id).cloned()
    }

    pub fn booking_rules(&self, service_id: ServiceId) -> Option<NewServiceBookingRules> {
        self.read().booking_rules.get(&service_id).cloned()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_service(&self, service: NewService) -> Result<ServiceId> {
        let mut state = self.write();
        state.begin(StoreOperation::InsertService)?;

        let slug_taken = state
            .services
            .values()
            .any(|s| s.salon_id == service.salon_id && s.slug == service.slug);
        if slug_taken {
            return Err(StoreError::SlugTaken {
                salon_id: service.salon_id,
                slug: service.slug,
            });
        }

        let id = ServiceId::new();
        state.services.insert(id, service);
        Ok(id)
    }

    async fn insert_pricing(&self, pricing: NewServicePricing) -> Result<()> {
        let mut state = self.write();
        state.begin(StoreOperation::InsertPricing)?;

        let service_id = pricing.service_id;
        if !state.services.contains_key(&service_id) {
            return Err(StoreError::ServiceNotFound(service_id));
        }
        if state.pricing.contains_key(&service_id) {
            return Err(StoreError::AlreadyExists {
                table: "service_pricing",
                service_id,
            });
        }

        state.pricing.insert(service_id, pricing);
        Ok(())
    }

    async fn insert_booking_rules(&self, rules: NewServiceBookingRules) -> Result<()> {
        let mut state = self.write();
        state.begin(StoreOperation::InsertBookingRules)?;

        let service_id = rules.service_id;
        if !state.services.contains_key(&service_id) || !state.pricing.contains_key(&service_id) {
            return Err(StoreError::ServiceNotFound(service_id));
        }
        if state.booking_rules.contains_key(&service_id) {
            return Err(StoreError::AlreadyExists {
                table: "service_booking_rules",
                service_id,
            });
        }

        state.booking_rules.insert(service_id, rules);
        Ok(())
    }

    async fn delete_pricing(&self, service_id: ServiceId) -> Result<()> {
        let mut state = self.write();
        state.begin(StoreOperation::DeletePricing)?;

        if state.booking_rules.contains_key(&service_id) {
            return Err(StoreError::HasDependents(service_id));
        }
        state.pricing.remove(&service_id);
        Ok(())
    }

    async fn delete_service(&self, service_id: ServiceId) -> Result<()> {
        let mut state = self.write();
        state.begin(StoreOperation::DeleteService)?;

        if state.pricing.contains_key(&service_id) || state.booking_rules.contains_key(&service_id)
        {
            return Err(StoreError::HasDependents(service_id));
        }
        state.services.remove(&service_id);
        Ok(())
    }

    async fn find_slugs_with_prefix(
        &self,
        salon_id: SalonId,
        prefix: &str,
        exclude: Option<ServiceId>,
    ) -> Result<Vec<String>> {
        let mut state = self.write();
        state.begin(StoreOperation::FindSlugs)?;

        let prefix = prefix.to_lowercase();
        let mut slugs: Vec<String> = state
            .services
            .iter()
            .filter(|(id, s)| {
                s.salon_id == salon_id
                    && Some(**id) != exclude
                    && s.slug.to_lowercase().starts_with(&prefix)
            })
            .map(|(_, s)| s.slug.clone())
            .collect();
        slugs.sort();
        Ok(slugs)
    }
}

#[cfg(test)]
mod tests {
    use catalog::{AuditStamp, ServiceDraft};
    use chrono::Utc;
    use common::{CategoryId, UserId};
    use serde_json::json;

    use super::*;

    fn draft() -> ServiceDraft {
        ServiceDraft::parse(
            &json!({ "name": "Haircut", "category_id": CategoryId::new().to_string() }),
            &json!({ "base_price": 50 }),
            &json!({ "duration_minutes": 30 }),
        )
        .unwrap()
    }

    fn stamp() -> AuditStamp {
        AuditStamp::created(UserId::new(), Utc::now())
    }

    fn new_service(salon_id: SalonId, slug: &str) -> NewService {
        NewService::new(salon_id, slug, &draft().service, stamp())
    }

    #[tokio::test]
    async fn insert_and_delete_full_service() {
        let store = InMemoryCatalogStore::new();
        let d = draft();
        let id = store
            .insert_service(new_service(SalonId::new(), "haircut"))
            .await
            .unwrap();
        store
            .insert_pricing(NewServicePricing::derive(id, &d.pricing, stamp()))
            .await
            .unwrap();
        store
            .insert_booking_rules(NewServiceBookingRules::derive(id, &d.booking_rules, stamp()))
            .await
            .unwrap();

        assert_eq!(store.service_count(), 1);
        assert_eq!(store.pricing_count(), 1);
        assert_eq!(store.booking_rules_count(), 1);
        assert_eq!(store.insert_attempts(), 3);
    }

    #[tokio::test]
    async fn slug_is_unique_per_salon() {
        let store = InMemoryCatalogStore::new();
        let salon = SalonId::new();
        store.insert_service(new_service(salon, "haircut")).await.unwrap();

        let err = store
            .insert_service(new_service(salon, "haircut"))
            .await
            .unwrap_err();
        assert!(err.is_slug_conflict());

        // Same slug in another salon is fine.
        store
            .insert_service(new_service(SalonId::new(), "haircut"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn children_require_parents() {
        let store = InMemoryCatalogStore::new();
        let d = draft();
        let orphan = ServiceId::new();

        let err = store
            .insert_pricing(NewServicePricing::derive(orphan, &d.pricing, stamp()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ServiceNotFound(id) if id == orphan));

        let id = store
            .insert_service(new_service(SalonId::new(), "haircut"))
            .await
            .unwrap();
        let err = store
            .insert_booking_rules(NewServiceBookingRules::derive(id, &d.booking_rules, stamp()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ServiceNotFound(_)));
    }

    #[tokio::test]
    async fn service_delete_is_blocked_by_pricing() {
        let store = InMemoryCatalogStore::new();
        let d = draft();
        let id = store
            .insert_service(new_service(SalonId::new(), "haircut"))
            .await
            .unwrap();
        store
            .insert_pricing(NewServicePricing::derive(id, &d.pricing, stamp()))
            .await
            .unwrap();

        assert!(matches!(
            store.delete_service(id).await,
            Err(StoreError::HasDependents(_))
        ));

        store.delete_pricing(id).await.unwrap();
        store.delete_service(id).await.unwrap();
        assert_eq!(store.service_count(), 0);
        assert_eq!(store.pricing_count(), 0);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded() {
        let store = InMemoryCatalogStore::new();
        store.set_fail_on(StoreOperation::InsertService, true);

        let err = store
            .insert_service(new_service(SalonId::new(), "haircut"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.operations(), vec![StoreOperation::InsertService]);
        assert_eq!(store.service_count(), 0);

        store.set_fail_on(StoreOperation::InsertService, false);
        store
            .insert_service(new_service(SalonId::new(), "haircut"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn prefix_search_is_scoped_and_case_insensitive() {
        let store = InMemoryCatalogStore::new();
        let salon = SalonId::new();
        let own = store.insert_service(new_service(salon, "haircut")).await.unwrap();
        store.insert_service(new_service(salon, "Haircut-2")).await.unwrap();
        store.insert_service(new_service(salon, "color")).await.unwrap();
        store
            .insert_service(new_service(SalonId::new(), "haircut-3"))
            .await
            .unwrap();

        let slugs = store
            .find_slugs_with_prefix(salon, "HAIRCUT", None)
            .await
            .unwrap();
        assert_eq!(slugs, vec!["Haircut-2".to_string(), "haircut".to_string()]);

        let slugs = store
            .find_slugs_with_prefix(salon, "haircut", Some(own))
            .await
            .unwrap();
        assert_eq!(slugs, vec!["Haircut-2".to_string()]);
    }
}
