//! HTTP server for the storefront.
//!
//! Exposes the catalog admin, cart, checkout and order administration
//! operations of the `commerce` crate over axum, with listing endpoints
//! served from the `projections` read models. Logging goes through
//! `tracing`, metrics through the Prometheus exporter.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the router with every route and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{admin, cart, health, metrics, orders, products};

    let metrics_router = Router::new()
        .route("/metrics", get(metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(health::check::<S>))
        .route("/products", post(products::create::<S>).get(products::list::<S>))
        .route("/products/{sku}", get(products::get::<S>))
        .route("/products/{sku}/price", post(products::reprice::<S>))
        .route("/products/{sku}/restock", post(products::restock::<S>))
        .route("/products/{sku}/purchases", post(products::track_purchase::<S>))
        .route("/cart", get(cart::get::<S>).delete(cart::clear::<S>))
        .route("/cart/items", post(cart::add_item::<S>))
        .route(
            "/cart/items/{line_id}",
            patch(cart::update_item::<S>).delete(cart::remove_item::<S>),
        )
        .route("/cart/merge", post(cart::merge::<S>))
        .route("/cart/refresh", post(cart::refresh::<S>))
        .route("/orders", post(orders::place::<S>).get(orders::board::<S>))
        .route("/orders/checkout", post(orders::checkout::<S>))
        .route("/orders/mine", get(orders::mine::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/status", post(orders::update_status::<S>))
        .route("/orders/{id}/cancel", post(orders::cancel::<S>))
        .route("/orders/{id}/admin", patch(orders::update_admin::<S>))
        .route("/orders/{id}/events", get(orders::events::<S>))
        .route("/admin/carts/purge", post(admin::purge_carts::<S>))
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

/// Creates the default application state over `store`.
pub fn create_default_state<S: EventStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}
