//! HTTP API server with observability for the storefront.
//!
//! Provides JSON endpoints for catalog browsing, cart management, checkout,
//! order history, and account management, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod registry;
pub mod routes;

use std::sync::Arc;

use accounts::AccountService;
use axum::Router;
use axum::routing::{get, post, put};
use catalog::CatalogService;
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::{CartService, CheckoutService, OrderService};
use store::ShopStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use registry::AdminRegistry;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ShopStore> {
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
    pub accounts: AccountService<S>,
    pub admin: AdminRegistry,
    pub store: S,
}

/// Creates the application state: one service per concern, all sharing the
/// store, plus the admin registry built here at startup.
pub fn create_state<S: ShopStore>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        carts: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        accounts: AccountService::new(store.clone()),
        admin: AdminRegistry::storefront(),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ShopStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/categories", get(routes::catalog::categories::<S>))
        .route("/products", get(routes::catalog::list::<S>))
        .route("/products/{slug}", get(routes::catalog::detail::<S>))
        .route("/cart", get(routes::cart::view::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{id}",
            put(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/checkout", post(routes::checkout::checkout::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::detail::<S>))
        .route("/accounts", post(routes::accounts::register::<S>))
        .route(
            "/account/profile",
            get(routes::accounts::profile::<S>).put(routes::accounts::update_profile::<S>),
        )
        .route("/admin", get(routes::admin::index::<S>))
        .route("/admin/orders/status", post(routes::admin::set_order_status::<S>))
        .route(
            "/admin/products/{id}/availability",
            put(routes::admin::set_availability::<S>),
        )
        .route(
            "/admin/products/{id}/price",
            put(routes::admin::set_price::<S>),
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
