//! HTTP API server with observability for the commerce backend.
//!
//! Provides REST endpoints for the catalog, carts, checkout and addresses,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use document_store::DocumentStore;
use domain::{Commerce, Deadlines};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/search", get(routes::products::search::<S>))
        .route("/users/{user_id}/cart", get(routes::cart::get::<S>))
        .route(
            "/users/{user_id}/cart/{product_id}",
            post(routes::cart::add::<S>).delete(routes::cart::remove::<S>),
        )
        .route(
            "/users/{user_id}/checkout",
            post(routes::checkout::buy_from_cart::<S>),
        )
        .route(
            "/users/{user_id}/instant-buy/{product_id}",
            post(routes::checkout::instant_buy::<S>),
        )
        .route(
            "/users/{user_id}/addresses",
            post(routes::addresses::add::<S>).delete(routes::addresses::delete::<S>),
        )
        .route(
            "/users/{user_id}/addresses/home",
            put(routes::addresses::edit_home::<S>),
        )
        .route(
            "/users/{user_id}/addresses/work",
            put(routes::addresses::edit_work::<S>),
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

/// Creates the application state over the given store.
pub fn create_default_state<S: DocumentStore + 'static>(
    store: S,
    deadlines: Deadlines,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        commerce: Commerce::with_deadlines(store, deadlines),
    })
}
