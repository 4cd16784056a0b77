//! Poster Shop
//!
//! Backend for a poster storefront.
//!
//! ## Features
//! - Product catalog with multi-scheme id resolution
//! - Per-user shopping cart with captured prices
//! - Checkout into immutable order snapshots
//! - Order status lifecycle and payment confirmation
//! - Idempotent catalog import keyed by external id

pub mod api;
pub mod auth;
pub mod bus;
pub mod config;
pub mod domain;
pub mod services;
pub mod store;

use domain::aggregates::{CartError, OrderError, OrderStatus, ProductError};
use domain::value_objects::{MoneyError, QuantityError, UnknownCategory};
use thiserror::Error;

pub use config::Config;
pub use api::AppState;
pub use services::{CartService, CatalogService, OrderService};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Item not found in cart")]
    ItemNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Identifier '{0}' matches more than one product")]
    AmbiguousProduct(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is already paid")]
    AlreadyPaid,

    #[error("Order is cancelled")]
    OrderCancelled,

    #[error("Concurrent update conflict, retry the request")]
    Conflict,

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, ShopError>;

impl From<CartError> for ShopError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound => Self::ItemNotFound,
            CartError::InvalidQuantity(msg) => Self::InvalidInput(msg),
            CartError::TotalOutOfRange => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<OrderError> for ShopError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyCart => Self::EmptyCart,
            OrderError::MissingProduct(_) => Self::ProductNotFound,
            OrderError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            OrderError::AlreadyPaid => Self::AlreadyPaid,
            OrderError::Cancelled => Self::OrderCancelled,
            OrderError::UnknownStatus(_) | OrderError::TotalOutOfRange => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<ProductError> for ShopError {
    fn from(e: ProductError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<QuantityError> for ShopError {
    fn from(e: QuantityError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<MoneyError> for ShopError {
    fn from(e: MoneyError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<UnknownCategory> for ShopError {
    fn from(e: UnknownCategory) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(e: validator::ValidationErrors) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<sqlx::Error> for ShopError {
    fn from(e: sqlx::Error) -> Self { Self::StorageError(e.to_string()) }
}

impl From<serde_json::Error> for ShopError {
    fn from(e: serde_json::Error) -> Self { Self::StorageError(e.to_string()) }
}
