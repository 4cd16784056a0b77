//! Domain events
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::{Money, OrderId, ProductId, UserId};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Cart(CartEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// Subject the event is published under, e.g. `shop.order.placed`.
    pub fn subject(&self) -> String {
        let (group, name) = match self {
            Self::Product(e) => ("product", e.name()),
            Self::Cart(e) => ("cart", e.name()),
            Self::Order(e) => ("order", e.name()),
        };
        format!("shop.{group}.{name}")
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: ProductId, custom_id: Option<String> },
    Updated { product_id: ProductId },
    Deleted { product_id: ProductId },
}

impl ProductEvent {
    fn name(&self) -> &'static str {
        match self { Self::Created { .. } => "created", Self::Updated { .. } => "updated", Self::Deleted { .. } => "deleted" }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    Changed { user_id: UserId, item_count: usize, total: Money },
    Cleared { user_id: UserId },
}

impl CartEvent {
    fn name(&self) -> &'static str {
        match self { Self::Changed { .. } => "changed", Self::Cleared { .. } => "cleared" }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, user_id: UserId, total: Money },
    StatusChanged { order_id: OrderId, from: OrderStatus, to: OrderStatus },
    Paid { order_id: OrderId },
}

impl OrderEvent {
    fn name(&self) -> &'static str {
        match self { Self::Placed { .. } => "placed", Self::StatusChanged { .. } => "status_changed", Self::Paid { .. } => "paid" }
    }
}
