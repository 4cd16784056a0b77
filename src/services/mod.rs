//! Application services. Each one owns a handle to the shared store and the
//! event bus; none of them know about HTTP.

pub mod cart;
pub mod catalog;
pub mod orders;

pub use cart::CartService;
pub use catalog::{CatalogService, ImportRecord, ImportReport};
pub use orders::OrderService;
