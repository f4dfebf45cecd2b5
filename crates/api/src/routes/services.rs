//! Service provisioning endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use catalog_store::CatalogStore;
use common::{SalonId, UserId};
use provisioning::{
    CacheInvalidator, CreateServiceOptions, InMemoryAccessGuard, ServiceProvisioner,
    TracingCacheInvalidator,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const CALLER_HEADER: &str = "x-user-id";

/// Shared application state accessible from all handlers.
pub struct AppState<S: CatalogStore, C: CacheInvalidator = TracingCacheInvalidator> {
    pub provisioner: ServiceProvisioner<S, InMemoryAccessGuard, C>,
    pub access: InMemoryAccessGuard,
    pub store_backend: &'static str,
}

// -- Request types --

/// The three raw payloads of a new service. Missing sections are passed on
/// as `null` and rejected by validation.
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub service: Value,
    #[serde(default)]
    pub pricing: Value,
    #[serde(default)]
    pub booking_rules: Value,
}

// -- Response types --

#[derive(Serialize)]
pub struct ServiceCreatedResponse {
    pub id: String,
    pub slug: String,
}

// -- Handlers --

/// POST /salons/:salon_id/services — create a service with pricing and booking rules.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: CatalogStore + 'static, C: CacheInvalidator + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(salon_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceCreatedResponse>), ApiError> {
    let salon_id = SalonId::parse(&salon_id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid salon ID: {e}")))?;

    let mut options = CreateServiceOptions::default();
    if let Some(caller) = caller_from_headers(&headers)? {
        options = options.with_caller(caller);
    }

    let created = state
        .provisioner
        .create_service(
            salon_id,
            &req.service,
            &req.pricing,
            &req.booking_rules,
            options,
        )
        .await?;

    let response = ServiceCreatedResponse {
        id: created.id.to_string(),
        slug: created.slug,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Reads the caller from [`CALLER_HEADER`]. An absent header leaves caller
/// resolution to the access guard.
fn caller_from_headers(headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    let Some(value) = headers.get(CALLER_HEADER) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {CALLER_HEADER} header")))?;
    UserId::parse(raw)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {CALLER_HEADER} header: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_missing_caller_header() {
        assert!(caller_from_headers(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_valid_caller_header() {
        let user = UserId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            CALLER_HEADER,
            HeaderValue::from_str(&user.to_string()).unwrap(),
        );
        assert_eq!(caller_from_headers(&headers).unwrap(), Some(user));
    }

    #[test]
    fn test_malformed_caller_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CALLER_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            caller_from_headers(&headers),
            Err(ApiError::BadRequest(_))
        ));
    }
}
