//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::aggregates::{Cart, Product};
use crate::domain::value_objects::{Money, OrderId, ProductId, Quantity, UserId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    shipping_address: ShippingAddress,
    payment_method: String,
    payment_result: Option<PaymentResult>,
    total_price: Money,
    status: OrderStatus,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Snapshot of a purchased product, frozen at checkout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: Quantity,
    pub price: Money,
    pub image: String,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<Money> { self.price.checked_mul(self.quantity.value()) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Position along the fulfilment path; cancelled sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Forward moves along the fulfilment path, or cancellation of a live order.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() { return false; }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

impl Order {
    /// Snapshots a non-empty cart into a pending order. Names and images come
    /// from `products`; prices are the ones captured in the cart.
    pub fn from_cart(
        cart: &Cart, products: &[Product], shipping_address: ShippingAddress, payment_method: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() { return Err(OrderError::EmptyCart); }
        let items = cart
            .items()
            .iter()
            .map(|line| {
                let product = products.iter().find(|p| p.id() == line.product_id).ok_or(OrderError::MissingProduct(line.product_id))?;
                Ok(OrderItem {
                    product_id: line.product_id, name: product.name().to_string(), quantity: line.quantity,
                    price: line.price, image: product.image().to_string(),
                })
            })
            .collect::<Result<Vec<_>, OrderError>>()?;
        let total_price = items
            .iter()
            .try_fold(Money::ZERO, |acc, item| item.line_total().and_then(|line| acc.checked_add(line)))
            .ok_or(OrderError::TotalOutOfRange)?;
        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(), user_id: cart.user_id().clone(), items, shipping_address,
            payment_method: payment_method.into(), payment_result: None, total_price,
            status: OrderStatus::Pending, is_paid: false, paid_at: None, is_delivered: false, delivered_at: None,
            created_at: now, updated_at: now,
        })
    }

    pub fn id(&self) -> OrderId { self.id }
    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn shipping_address(&self) -> &ShippingAddress { &self.shipping_address }
    pub fn payment_method(&self) -> &str { &self.payment_method }
    pub fn payment_result(&self) -> Option<&PaymentResult> { self.payment_result.as_ref() }
    pub fn total_price(&self) -> Money { self.total_price }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn is_paid(&self) -> bool { self.is_paid }
    pub fn paid_at(&self) -> Option<DateTime<Utc>> { self.paid_at }
    pub fn is_delivered(&self) -> bool { self.is_delivered }
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> { self.delivered_at }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn is_owned_by(&self, user: &UserId) -> bool { &self.user_id == user }

    /// Moves to `next`, returning the previous status. Re-setting the current
    /// status is a no-op.
    pub fn set_status(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        if from == next { return Ok(from); }
        if !from.can_transition_to(next) { return Err(OrderError::InvalidTransition { from, to: next }); }
        self.status = next;
        if next == OrderStatus::Delivered {
            self.is_delivered = true;
            self.delivered_at = Some(Utc::now());
        }
        self.touch();
        Ok(from)
    }

    pub fn mark_paid(&mut self, result: PaymentResult) -> Result<(), OrderError> {
        if self.is_paid { return Err(OrderError::AlreadyPaid); }
        if self.status == OrderStatus::Cancelled { return Err(OrderError::Cancelled); }
        self.is_paid = true;
        self.paid_at = Some(Utc::now());
        self.payment_result = Some(result);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("product {0} no longer exists")]
    MissingProduct(ProductId),
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order is already paid")]
    AlreadyPaid,
    #[error("order is cancelled")]
    Cancelled,
    #[error("order total exceeds the maximum amount")]
    TotalOutOfRange,
    #[error("unknown order status '{0}'")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;

    fn checkout_fixture() -> (Cart, Vec<Product>) {
        let p1 = Product::create(sample("P1", Money::whole(10))).unwrap();
        let p2 = Product::create(sample("P2", Money::whole(25))).unwrap();
        let mut cart = Cart::new(UserId::new("u1"));
        cart.add_item(&p1, Quantity::new(2).unwrap()).unwrap();
        cart.add_item(&p2, Quantity::ONE).unwrap();
        (cart, vec![p1, p2])
    }

    #[test]
    fn test_order_from_cart() {
        let (cart, products) = checkout_fixture();
        let order = Order::from_cart(&cart, &products, ShippingAddress::default(), "PayPal").unwrap();
        assert_eq!(order.total_price(), Money::whole(45));
        assert_eq!(order.total_price(), cart.total());
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.items()[0].name, "P1");
        assert!(!order.is_paid());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let cart = Cart::new(UserId::new("u1"));
        assert_eq!(Order::from_cart(&cart, &[], ShippingAddress::default(), "PayPal").unwrap_err(), OrderError::EmptyCart);
    }

    #[test]
    fn test_snapshot_ignores_later_price_changes() {
        let (cart, mut products) = checkout_fixture();
        let order = Order::from_cart(&cart, &products, ShippingAddress::default(), "PayPal").unwrap();
        products[0].update_price(Money::whole(1000));
        assert_eq!(order.items()[0].price, Money::whole(10));
    }

    #[test]
    fn test_order_workflow() {
        let (cart, products) = checkout_fixture();
        let mut order = Order::from_cart(&cart, &products, ShippingAddress::default(), "PayPal").unwrap();
        assert_eq!(order.set_status(OrderStatus::Processing).unwrap(), OrderStatus::Pending);
        order.set_status(OrderStatus::Shipped).unwrap();
        order.set_status(OrderStatus::Delivered).unwrap();
        assert!(order.is_delivered());
        assert!(order.delivered_at().is_some());
        assert!(matches!(order.set_status(OrderStatus::Pending), Err(OrderError::InvalidTransition { .. })));
        assert!(matches!(order.set_status(OrderStatus::Cancelled), Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_mark_paid_keeps_status() {
        let (cart, products) = checkout_fixture();
        let mut order = Order::from_cart(&cart, &products, ShippingAddress::default(), "PayPal").unwrap();
        order.mark_paid(PaymentResult { id: "PAY-1".into(), status: "COMPLETED".into(), ..Default::default() }).unwrap();
        assert!(order.is_paid());
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.mark_paid(PaymentResult::default()), Err(OrderError::AlreadyPaid));
    }

    #[test]
    fn test_cancelled_order_cannot_be_paid() {
        let (cart, products) = checkout_fixture();
        let mut order = Order::from_cart(&cart, &products, ShippingAddress::default(), "PayPal").unwrap();
        order.set_status(OrderStatus::Cancelled).unwrap();
        let err = order.mark_paid(PaymentResult::default()).unwrap_err();
        assert_eq!(err, OrderError::Cancelled);
        assert_eq!(err.to_string(), "order is cancelled");
        assert!(!order.is_paid());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
