//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use ::metrics::Unit;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for every metric the commerce services emit.
pub fn describe() {
    ::metrics::describe_counter!("cart_items_added_total", "Products added to carts");
    ::metrics::describe_counter!(
        "cart_items_removed_total",
        "Cart removals that dropped at least one entry"
    );
    ::metrics::describe_counter!("orders_placed_total", "Orders committed, by kind");
    ::metrics::describe_counter!(
        "checkout_partial_failures_total",
        "Order commits that failed after an earlier write was applied, by stage"
    );
    ::metrics::describe_counter!(
        "address_limit_rejections_total",
        "Addresses refused because both slots were taken"
    );
    ::metrics::describe_counter!(
        "operation_timeouts_total",
        "Operations abandoned at their deadline"
    );
    ::metrics::describe_histogram!(
        "checkout_duration_seconds",
        Unit::Seconds,
        "Time to commit an order"
    );
}

/// GET /metrics renders the Prometheus exposition.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
