//! Checkout and order lifecycle

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::Caller;
use crate::bus::EventBus;
use crate::domain::aggregates::{Order, OrderStatus, PaymentResult, ShippingAddress};
use crate::domain::events::{CartEvent, DomainEvent, OrderEvent};
use crate::domain::value_objects::{OrderId, ProductId, UserId};
use crate::store::ShopStore;
use crate::{Result, ShopError};

/// Checkout attempts before a concurrent cart edit fails the request
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn ShopStore>,
    bus: EventBus,
}

impl OrderService {
    pub fn new(store: Arc<dyn ShopStore>, bus: EventBus) -> Self { Self { store, bus } }

    /// Turns the user's cart into a pending order and empties the cart.
    #[instrument(skip(self, shipping_address))]
    pub async fn place(&self, user: &UserId, shipping_address: ShippingAddress, payment_method: &str) -> Result<Order> {
        for attempt in 1..=MAX_ATTEMPTS {
            let Some(cart) = self.store.load_cart(user).await? else { return Err(ShopError::EmptyCart) };
            if cart.is_empty() { return Err(ShopError::EmptyCart); }

            let ids: Vec<ProductId> = cart.items().iter().map(|i| i.product_id).collect();
            let products = self.store.get_products(&ids).await?;
            let order = Order::from_cart(&cart, &products, shipping_address.clone(), payment_method)?;

            let mut emptied = cart;
            emptied.clear();
            match self.store.place_order(&order, &emptied).await {
                Ok(_) => {
                    info!(order_id = %order.id(), total = %order.total_price(), items = order.items().len(), "order placed");
                    self.bus.publish(DomainEvent::Order(OrderEvent::Placed {
                        order_id: order.id(), user_id: user.clone(), total: order.total_price(),
                    })).await;
                    self.bus.publish(DomainEvent::Cart(CartEvent::Cleared { user_id: user.clone() })).await;
                    return Ok(order);
                }
                Err(ShopError::Conflict) => warn!(attempt, "cart changed during checkout, retrying"),
                Err(e) => return Err(e),
            }
        }
        Err(ShopError::Conflict)
    }

    /// Visible to its owner and to admins.
    pub async fn get(&self, caller: &Caller, raw_id: &str) -> Result<Order> {
        let order = self.load(raw_id).await?;
        if !caller.is_admin() && !order.is_owned_by(&caller.user_id) { return Err(ShopError::Forbidden); }
        Ok(order)
    }

    pub async fn list_mine(&self, user: &UserId) -> Result<Vec<Order>> {
        self.store.orders_for_user(user).await
    }

    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<Order>> {
        if !caller.is_admin() { return Err(ShopError::Forbidden); }
        self.store.all_orders().await
    }

    #[instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn set_status(&self, caller: &Caller, raw_id: &str, status: OrderStatus) -> Result<Order> {
        if !caller.is_admin() { return Err(ShopError::Forbidden); }
        let mut order = self.load(raw_id).await?;
        let from = order.set_status(status)?;
        if from == status { return Ok(order); }
        self.store.update_order(&order).await?;
        info!(order_id = %order.id(), %from, to = %status, "order status changed");
        self.bus.publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id: order.id(), from, to: status })).await;
        Ok(order)
    }

    #[instrument(skip(self, caller, payment), fields(caller = %caller.user_id))]
    pub async fn mark_paid(&self, caller: &Caller, raw_id: &str, payment: PaymentResult) -> Result<Order> {
        let mut order = self.load(raw_id).await?;
        if !caller.is_admin() && !order.is_owned_by(&caller.user_id) { return Err(ShopError::Forbidden); }
        order.mark_paid(payment)?;
        self.store.update_order(&order).await?;
        info!(order_id = %order.id(), "order paid");
        self.bus.publish(DomainEvent::Order(OrderEvent::Paid { order_id: order.id() })).await;
        Ok(order)
    }

    async fn load(&self, raw_id: &str) -> Result<Order> {
        let id = OrderId::parse(raw_id).ok_or(ShopError::OrderNotFound)?;
        self.store.get_order(id).await?.ok_or(ShopError::OrderNotFound)
    }
}
