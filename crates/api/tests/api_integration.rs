//! Integration tests for the API server.

use std::sync::OnceLock;

use api::config::Config;
use api::routes::services::CALLER_HEADER;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog_store::{InMemoryCatalogStore, StoreOperation};
use common::{CategoryId, SalonId, UserId};
use metrics_exporter_prometheus::PrometheusHandle;
use provisioning::InMemoryCacheInvalidator;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryCatalogStore,
    cache: InMemoryCacheInvalidator,
    salon: SalonId,
    owner: UserId,
}

fn setup() -> TestApp {
    let store = InMemoryCatalogStore::new();
    let cache = InMemoryCacheInvalidator::new();
    let state = api::create_state(store.clone(), "memory", &Config::default(), cache.clone());
    let app = api::create_app(state.clone(), get_metrics_handle());

    let salon = SalonId::new();
    let owner = UserId::new();
    state.access.grant(salon, owner);

    TestApp {
        app,
        store,
        cache,
        salon,
        owner,
    }
}

fn haircut_body() -> Value {
    json!({
        "service": { "name": "Haircut", "category_id": CategoryId::new().to_string() },
        "pricing": { "base_price": "50", "sale_price": "40", "cost": "20" },
        "booking_rules": { "duration_minutes": "30", "buffer_minutes": "10" },
    })
}

fn create_request(salon: &str, caller: Option<UserId>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/salons/{salon}/services"))
        .header("content-type", "application/json");
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller.to_string());
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
}

#[tokio::test]
async fn test_create_service() {
    let t = setup();

    let response = t
        .app
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(t.owner),
            &haircut_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["slug"], "haircut");
    assert!(json["id"].as_str().is_some());

    assert_eq!(t.store.service_count(), 1);
    assert_eq!(t.store.pricing_count(), 1);
    assert_eq!(t.store.booking_rules_count(), 1);
    assert_eq!(
        t.cache.invalidated(),
        vec![format!("/salons/{}/services", t.salon)]
    );
}

#[tokio::test]
async fn test_second_create_gets_suffixed_slug() {
    let t = setup();

    let first = t
        .app
        .clone()
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(t.owner),
            &haircut_body(),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = t
        .app
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(t.owner),
            &haircut_body(),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(body_json(second).await["slug"], "haircut-2");
}

#[tokio::test]
async fn test_validation_error_is_bad_request() {
    let t = setup();
    let mut body = haircut_body();
    body["pricing"]["sale_price"] = json!("60");

    let response = t
        .app
        .oneshot(create_request(&t.salon.to_string(), Some(t.owner), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Sale price cannot exceed base price");
    assert_eq!(json["field"], "sale_price");
    assert!(t.store.operations().is_empty());
}

#[tokio::test]
async fn test_missing_category_is_bad_request() {
    let t = setup();
    let mut body = haircut_body();
    body["service"] = json!({ "name": "Haircut" });

    let response = t
        .app
        .oneshot(create_request(&t.salon.to_string(), Some(t.owner), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["field"], "category_id");
}

#[tokio::test]
async fn test_missing_caller_is_unauthorized() {
    let t = setup();

    let response = t
        .app
        .oneshot(create_request(&t.salon.to_string(), None, &haircut_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(t.store.operations().is_empty());
}

#[tokio::test]
async fn test_caller_without_access_is_forbidden() {
    let t = setup();

    let response = t
        .app
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(UserId::new()),
            &haircut_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(t.store.operations().is_empty());
}

#[tokio::test]
async fn test_invalid_salon_id() {
    let t = setup();

    let response = t
        .app
        .oneshot(create_request("not-a-uuid", Some(t.owner), &haircut_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_failure_rolls_back_and_returns_500() {
    let t = setup();
    t.store.set_fail_on(StoreOperation::InsertBookingRules, true);

    let response = t
        .app
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(t.owner),
            &haircut_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to create booking_rules")
    );
    assert_eq!(t.store.service_count(), 0);
    assert_eq!(t.store.pricing_count(), 0);
}

#[tokio::test]
async fn test_failed_rollback_returns_500_with_service_id() {
    let t = setup();
    t.store.set_fail_on(StoreOperation::InsertPricing, true);
    t.store.set_fail_on(StoreOperation::DeleteService, true);

    let response = t
        .app
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(t.owner),
            &haircut_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("Could not delete service")
    );
    assert_eq!(t.store.service_count(), 1);
}

#[tokio::test]
async fn test_default_state_serves_creates() {
    let store = InMemoryCatalogStore::new();
    let state = api::create_default_state(store.clone(), "memory", &Config::default());
    let app = api::create_app(state.clone(), get_metrics_handle());
    let salon = SalonId::new();
    let owner = UserId::new();
    state.access.grant(salon, owner);

    let response = app
        .oneshot(create_request(&salon.to_string(), Some(owner), &haircut_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.service_count(), 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();

    // Drive one provisioning run so the counters exist.
    let response = t
        .app
        .clone()
        .oneshot(create_request(
            &t.salon.to_string(),
            Some(t.owner),
            &haircut_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("provisioning_executions_total"));
}
