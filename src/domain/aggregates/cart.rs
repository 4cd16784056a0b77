//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, ProductId, Quantity, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    user_id: UserId,
    items: Vec<CartItem>,
    total: Money,
    revision: u64,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Price captured when the product was first added
    pub price: Money,
}

impl CartItem {
    /// `None` when the line would exceed [`Money::max`].
    pub fn line_total(&self) -> Option<Money> { self.price.checked_mul(self.quantity.value()) }
}

impl Cart {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, items: vec![], total: Money::ZERO, revision: 0, updated_at: Utc::now() }
    }

    /// Rebuilds a stored cart; the total is recomputed rather than trusted.
    pub fn restore(user_id: UserId, items: Vec<CartItem>, revision: u64, updated_at: DateTime<Utc>) -> Result<Self, CartError> {
        let total = total_of(&items)?;
        Ok(Self { user_id, items, total, revision, updated_at })
    }

    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total(&self) -> Money { self.total }
    pub fn revision(&self) -> u64 { self.revision }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn contains(&self, product_id: ProductId) -> bool { self.items.iter().any(|i| i.product_id == product_id) }
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> { self.items.iter().find(|i| i.product_id == product_id) }

    /// Adds `quantity` of `product`, merging into an existing line without
    /// refreshing its captured price.
    pub fn add_item(&mut self, product: &Product, quantity: Quantity) -> Result<(), CartError> {
        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|i| i.product_id == product.id()) {
            existing.quantity = existing.quantity.add(quantity);
        } else {
            items.push(CartItem { product_id: product.id(), quantity, price: product.price() });
        }
        self.commit(items)
    }

    /// Sets a line's quantity exactly; zero or less drops the line.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        let idx = self.items.iter().position(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        let mut items = self.items.clone();
        if quantity <= 0 {
            items.remove(idx);
        } else {
            let q = Quantity::new(quantity).map_err(|e| CartError::InvalidQuantity(e.to_string()))?;
            if let Some(item) = items.get_mut(idx) { item.quantity = q; }
        }
        self.commit(items)
    }

    /// Returns whether a line was removed; absent lines are not an error.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<bool, CartError> {
        if !self.contains(product_id) { return Ok(false); }
        let items = self.items.iter().filter(|i| i.product_id != product_id).cloned().collect();
        self.commit(items)?;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Money::ZERO;
        self.updated_at = Utc::now();
    }

    /// Called by stores after a successful write.
    pub fn bump_revision(&mut self) { self.revision += 1; }

    pub fn computed_total(&self) -> Result<Money, CartError> { total_of(&self.items) }

    /// Swaps in `items` only if their total is representable, so a failed
    /// mutation leaves the cart untouched.
    fn commit(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        self.total = total_of(&items)?;
        self.items = items;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn total_of(items: &[CartItem]) -> Result<Money, CartError> {
    items
        .iter()
        .try_fold(Money::ZERO, |acc, item| item.line_total().and_then(|line| acc.checked_add(line)))
        .ok_or(CartError::TotalOutOfRange)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("item not found in cart")]
    ItemNotFound,
    #[error("{0}")]
    InvalidQuantity(String),
    #[error("cart total would exceed the maximum amount")]
    TotalOutOfRange,
}
