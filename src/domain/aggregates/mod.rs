//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{NewProduct, Product, ProductError, ProductPatch};
pub use order::{Order, OrderError, OrderItem, OrderStatus, PaymentResult, ShippingAddress};
pub use cart::{Cart, CartError, CartItem};
