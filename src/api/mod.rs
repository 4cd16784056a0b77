//! HTTP surface

mod cart;
mod error;
mod extract;
mod orders;
mod products;

pub use error::ErrorBody;
pub use extract::{AdminUser, CurrentUser, ValidJson};

use axum::{routing::{get, post, put}, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::JwtService;
use crate::bus::EventBus;
use crate::services::{CartService, CatalogService, OrderService};
use crate::store::ShopStore;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub orders: OrderService,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Wires every service onto the same store handle and event bus.
    pub fn new(store: Arc<dyn ShopStore>, bus: EventBus, jwt: JwtService) -> Self {
        let catalog = CatalogService::new(store.clone(), bus.clone());
        Self {
            carts: CartService::new(store.clone(), catalog.clone(), bus.clone()),
            orders: OrderService::new(store, bus),
            catalog,
            jwt: Arc::new(jwt),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "poster-shop"})) }))
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/import", post(products::import))
        .route("/api/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/api/cart", get(cart::get).post(cart::add).delete(cart::clear))
        .route("/api/cart/:product_id", put(cart::update).delete(cart::remove))
        .route("/api/orders", get(orders::list_all).post(orders::place))
        .route("/api/orders/myorders", get(orders::mine))
        .route("/api/orders/:id", get(orders::get))
        .route("/api/orders/:id/status", put(orders::set_status))
        .route("/api/orders/:id/pay", put(orders::pay))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
