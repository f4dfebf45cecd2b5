//! HTTP API server for salon service provisioning.
//!
//! Exposes the provisioning saga over REST, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use catalog_store::CatalogStore;
use metrics_exporter_prometheus::PrometheusHandle;
use provisioning::{
    CacheInvalidator, InMemoryAccessGuard, ServiceProvisioner, TracingCacheInvalidator,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::services::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CatalogStore + 'static, C: CacheInvalidator + 'static>(
    state: Arc<AppState<S, C>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S, C>))
        .route(
            "/salons/{salon_id}/services",
            post(routes::services::create::<S, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state around `store`.
///
/// Access grants are kept in memory; with `allow_all_salons` every caller
/// may manage every salon. There is no shared listing cache, so
/// invalidations are only logged.
pub fn create_default_state<S: CatalogStore + 'static>(
    store: S,
    store_backend: &'static str,
    config: &Config,
) -> Arc<AppState<S>> {
    create_state(store, store_backend, config, TracingCacheInvalidator)
}

/// Creates application state around `store` with a specific cache invalidator.
pub fn create_state<S: CatalogStore + 'static, C: CacheInvalidator + 'static>(
    store: S,
    store_backend: &'static str,
    config: &Config,
    cache: C,
) -> Arc<AppState<S, C>> {
    let access = if config.allow_all_salons {
        InMemoryAccessGuard::allowing_all()
    } else {
        InMemoryAccessGuard::new()
    };
    let provisioner = ServiceProvisioner::new(store, access.clone(), cache);

    Arc::new(AppState {
        provisioner,
        access,
        store_backend,
    })
}
