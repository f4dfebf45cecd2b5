//! Saga coordinator for creating a salon service.

use catalog::{AuditStamp, NewService, NewServiceBookingRules, NewServicePricing, ServiceDraft};
use catalog_store::CatalogStore;
use chrono::{DateTime, Utc};
use common::{SalonId, ServiceId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collaborators::{AccessGuard, CacheInvalidator};
use crate::error::{AuthorizationError, ProvisioningError, Result};
use crate::rollback::rollback;
use crate::service_creation::{self, ProvisioningStep};
use crate::slug::generate_unique_slug;
use crate::state::ProvisioningState;

/// Per-call overrides for [`ServiceProvisioner::create_service`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateServiceOptions {
    /// Caller already resolved by the surrounding request; skips `resolve_caller`.
    pub caller: Option<UserId>,
    /// Timestamp for all three rows. Defaults to the current time.
    pub now: Option<DateTime<Utc>>,
    /// Skip the salon access check, for trusted system-to-system calls.
    pub skip_access_check: bool,
}

impl CreateServiceOptions {
    pub fn with_caller(mut self, caller: UserId) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn trusted(mut self) -> Self {
        self.skip_access_check = true;
        self
    }
}

/// A successfully provisioned service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedService {
    pub id: ServiceId,
    pub slug: String,
}

/// Orchestrates the creation of a service and its pricing and booking rules.
///
/// The three rows are inserted in order (service, pricing, booking rules).
/// When a later insert fails, the rows already written are deleted in
/// reverse order before the error is returned.
pub struct ServiceProvisioner<S, A, C>
where
    S: CatalogStore,
    A: AccessGuard,
    C: CacheInvalidator,
{
    store: S,
    access: A,
    cache: C,
}

impl<S, A, C> ServiceProvisioner<S, A, C>
where
    S: CatalogStore,
    A: AccessGuard,
    C: CacheInvalidator,
{
    /// Creates a new service provisioner.
    pub fn new(store: S, access: A, cache: C) -> Self {
        Self {
            store,
            access,
            cache,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a service in `salon_id` from three raw payloads.
    ///
    /// Nothing is written unless the caller is authorized, all three payloads
    /// validate and a category is set. Returns the new service id and slug.
    #[tracing::instrument(
        skip(self, service, pricing, booking_rules, options),
        fields(saga_type = service_creation::SAGA_TYPE)
    )]
    pub async fn create_service(
        &self,
        salon_id: SalonId,
        service: &Value,
        pricing: &Value,
        booking_rules: &Value,
        options: CreateServiceOptions,
    ) -> Result<CreatedService> {
        metrics::counter!("provisioning_executions_total").increment(1);
        let started = std::time::Instant::now();
        tracing::info!("service provisioning started");

        let mut state = ProvisioningState::default();
        let result = self
            .provision(
                &mut state,
                salon_id,
                service,
                pricing,
                booking_rules,
                options,
            )
            .await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("provisioning_duration_seconds").record(duration);

        match &result {
            Ok(created) => {
                metrics::counter!("provisioning_completed").increment(1);
                tracing::info!(
                    service_id = %created.id,
                    slug = %created.slug,
                    duration,
                    "service provisioned successfully"
                );
            }
            Err(e) => {
                metrics::counter!("provisioning_failed", "reason" => e.kind()).increment(1);
                match e {
                    ProvisioningError::Compensation { failure, .. } => tracing::error!(
                        service_id = %failure.service_id(),
                        error = %e,
                        "service provisioning failed and left rows behind"
                    ),
                    _ => tracing::warn!(
                        state = %state,
                        reason = e.kind(),
                        step = e.step().map(|s| s.as_str()),
                        error = %e,
                        "service provisioning failed"
                    ),
                }
            }
        }

        result
    }

    async fn provision(
        &self,
        state: &mut ProvisioningState,
        salon_id: SalonId,
        service: &Value,
        pricing: &Value,
        booking_rules: &Value,
        options: CreateServiceOptions,
    ) -> Result<CreatedService> {
        // 1. Caller and salon access
        let caller = match self.authorize(salon_id, &options).await {
            Ok(caller) => caller,
            Err(e) => return Err(fail(state, e.into())),
        };

        // 2. Validate all three payloads, then the category rule
        advance(state, ProvisioningState::Validating);
        let draft = match ServiceDraft::parse(service, pricing, booking_rules) {
            Ok(draft) => draft,
            Err(e) => return Err(fail(state, e.into())),
        };
        if let Err(e) = draft.require_category() {
            return Err(fail(state, e.into()));
        }

        // 3. Slug
        advance(state, ProvisioningState::SlugResolving);
        let slug = generate_unique_slug(&self.store, salon_id, &draft.service.name, None)
            .await
            .map_err(|e| {
                fail(
                    state,
                    ProvisioningError::data_store(ProvisioningStep::Service, e),
                )
            })?;

        let audit = AuditStamp::created(caller, options.now.unwrap_or_else(Utc::now));

        // 4. Step 1: Insert service
        advance(state, ProvisioningState::ServiceInserting);
        tracing::info!(step = ProvisioningStep::Service.as_str(), %slug, "saga step started");
        let service_id = self
            .store
            .insert_service(NewService::new(salon_id, &slug, &draft.service, audit))
            .await
            .map_err(|e| {
                fail(
                    state,
                    ProvisioningError::data_store(ProvisioningStep::Service, e),
                )
            })?;

        // 5. Step 2: Insert pricing
        advance(state, ProvisioningState::PricingInserting);
        tracing::info!(step = ProvisioningStep::Pricing.as_str(), %service_id, "saga step started");
        let pricing_row = NewServicePricing::derive(service_id, &draft.pricing, audit);
        if let Err(e) = self.store.insert_pricing(pricing_row).await {
            let original = ProvisioningError::data_store(ProvisioningStep::Pricing, e);
            return Err(self.compensate(state, service_id, false, original).await);
        }

        // 6. Step 3: Insert booking rules
        advance(state, ProvisioningState::BookingRulesInserting);
        tracing::info!(
            step = ProvisioningStep::BookingRules.as_str(),
            %service_id,
            "saga step started"
        );
        let rules_row = NewServiceBookingRules::derive(service_id, &draft.booking_rules, audit);
        if let Err(e) = self.store.insert_booking_rules(rules_row).await {
            let original = ProvisioningError::data_store(ProvisioningStep::BookingRules, e);
            return Err(self.compensate(state, service_id, true, original).await);
        }

        advance(state, ProvisioningState::Committed);

        // 7. Listing cache, best effort
        let key = service_creation::listing_cache_key(salon_id);
        if let Err(e) = self.cache.invalidate(&key).await {
            tracing::warn!(%key, error = %e, "listing cache invalidation failed");
        }

        Ok(CreatedService {
            id: service_id,
            slug,
        })
    }

    async fn authorize(
        &self,
        salon_id: SalonId,
        options: &CreateServiceOptions,
    ) -> std::result::Result<UserId, AuthorizationError> {
        let caller = match options.caller {
            Some(caller) => caller,
            None => self.access.resolve_caller(salon_id).await?,
        };

        if !options.skip_access_check && !self.access.can_access_salon(salon_id, caller).await? {
            return Err(AuthorizationError::Forbidden { salon_id });
        }

        Ok(caller)
    }

    /// Rolls back after a failed insert and returns the error to surface.
    async fn compensate(
        &self,
        state: &mut ProvisioningState,
        service_id: ServiceId,
        include_pricing: bool,
        original: ProvisioningError,
    ) -> ProvisioningError {
        advance(state, ProvisioningState::RollingBack);
        tracing::warn!(%service_id, error = %original, "saga step failed, rolling back");

        let error = match rollback(&self.store, service_id, include_pricing).await {
            Ok(()) => original,
            Err(failure) => ProvisioningError::Compensation {
                original: Box::new(original),
                failure,
            },
        };

        advance(state, ProvisioningState::Failed);
        error
    }
}

fn advance(state: &mut ProvisioningState, next: ProvisioningState) {
    debug_assert!(state.can_transition_to(next), "{state} -> {next}");
    tracing::debug!(from = %state, to = %next, "provisioning state changed");
    *state = next;
}

fn fail(state: &mut ProvisioningState, error: ProvisioningError) -> ProvisioningError {
    advance(state, ProvisioningState::Failed);
    error
}

#[cfg(test)]
mod tests {
    use catalog_store::{InMemoryCatalogStore, StoreOperation};
    use common::CategoryId;
    use serde_json::json;

    use super::*;
    use crate::collaborators::{InMemoryAccessGuard, InMemoryCacheInvalidator};

    type TestProvisioner =
        ServiceProvisioner<InMemoryCatalogStore, InMemoryAccessGuard, InMemoryCacheInvalidator>;

    struct Harness {
        provisioner: TestProvisioner,
        store: InMemoryCatalogStore,
        access: InMemoryAccessGuard,
        cache: InMemoryCacheInvalidator,
        salon: SalonId,
        user: UserId,
    }

    impl Harness {
        fn new() -> Self {
            let store = InMemoryCatalogStore::new();
            let access = InMemoryAccessGuard::new();
            let cache = InMemoryCacheInvalidator::new();
            let salon = SalonId::new();
            let user = UserId::new();
            access.sign_in(user);
            access.grant(salon, user);

            Self {
                provisioner: ServiceProvisioner::new(store.clone(), access.clone(), cache.clone()),
                store,
                access,
                cache,
                salon,
                user,
            }
        }

        async fn create(&self, service: Value) -> Result<CreatedService> {
            self.provisioner
                .create_service(
                    self.salon,
                    &service,
                    &json!({ "base_price": 50, "sale_price": 40, "cost": 20 }),
                    &json!({ "duration_minutes": 30, "buffer_minutes": 10 }),
                    CreateServiceOptions::default(),
                )
                .await
        }
    }

    fn haircut() -> Value {
        json!({ "name": "Haircut", "category_id": CategoryId::new().to_string() })
    }

    #[tokio::test]
    async fn test_resolves_caller_from_session() {
        let h = Harness::new();
        let created = h.create(haircut()).await.unwrap();

        let row = h.store.service(created.id).unwrap();
        assert_eq!(row.audit.created_by, h.user);
        assert_eq!(row.audit.updated_by, h.user);
        assert_eq!(h.access.check_count(), 1);
    }

    #[tokio::test]
    async fn test_one_timestamp_for_all_rows() {
        let h = Harness::new();
        let now = Utc::now();
        let created = h
            .provisioner
            .create_service(
                h.salon,
                &haircut(),
                &json!({ "base_price": 50 }),
                &json!({ "duration_minutes": 30 }),
                CreateServiceOptions::default().at(now),
            )
            .await
            .unwrap();

        let service = h.store.service(created.id).unwrap();
        let pricing = h.store.pricing(created.id).unwrap();
        let rules = h.store.booking_rules(created.id).unwrap();
        for audit in [service.audit, pricing.audit, rules.audit] {
            assert_eq!(audit.created_at, now);
            assert_eq!(audit.updated_at, now);
        }
    }

    #[tokio::test]
    async fn test_invalidates_salon_listing() {
        let h = Harness::new();
        h.create(haircut()).await.unwrap();

        assert_eq!(
            h.cache.invalidated(),
            vec![service_creation::listing_cache_key(h.salon)]
        );
    }

    #[tokio::test]
    async fn test_cache_failure_does_not_fail_saga() {
        let h = Harness::new();
        h.cache.set_fail_on_invalidate(true);

        let created = h.create(haircut()).await.unwrap();
        assert!(h.store.service(created.id).is_some());
        assert_eq!(h.store.booking_rules_count(), 1);
    }

    #[tokio::test]
    async fn test_authorization_happens_before_validation() {
        let h = Harness::new();
        let outsider = UserId::new();

        let err = h
            .provisioner
            .create_service(
                h.salon,
                &json!({}),
                &json!({}),
                &json!({}),
                CreateServiceOptions::default().with_caller(outsider),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisioningError::Authorization(AuthorizationError::Forbidden { .. })
        ));
        assert!(h.store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_trusted_call_skips_access_check() {
        let h = Harness::new();
        let system_user = UserId::new();

        h.provisioner
            .create_service(
                h.salon,
                &haircut(),
                &json!({ "base_price": 50 }),
                &json!({ "duration_minutes": 30 }),
                CreateServiceOptions::default()
                    .with_caller(system_user)
                    .trusted(),
            )
            .await
            .unwrap();

        assert_eq!(h.access.check_count(), 0);
        assert_eq!(h.store.service_count(), 1);
    }

    #[tokio::test]
    async fn test_slug_lookup_failure_is_service_step_without_rollback() {
        let h = Harness::new();
        h.store.set_fail_on(StoreOperation::FindSlugs, true);

        let err = h.create(haircut()).await.unwrap_err();

        assert_eq!(err.step(), Some(ProvisioningStep::Service));
        assert_eq!(h.store.operations(), vec![StoreOperation::FindSlugs]);
    }
}
