//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::value_objects::{Category, Money, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    custom_id: Option<String>,
    name: String,
    description: String,
    price: Money,
    image: String,
    category: Category,
    stock: u32,
    in_stock: bool,
    #[serde(skip)]
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Fields required to create a product
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub custom_id: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image: String,
    pub category: Category,
    pub stock: u32,
}

/// Partial admin edit; `None` leaves the field untouched
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub stock: Option<u32>,
}

impl Product {
    pub fn create(new: NewProduct) -> Result<Self, ProductError> {
        let name = new.name.trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            custom_id: new.custom_id.filter(|c| !c.is_empty()),
            name, description: new.description, price: new.price, image: new.image,
            category: new.category, stock: new.stock, in_stock: new.stock > 0,
            deleted: false, created_at: now, updated_at: now,
        })
    }

    /// Rebuilds a product from persisted fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ProductId, custom_id: Option<String>, name: String, description: String, price: Money,
        image: String, category: Category, stock: u32, deleted: bool,
        created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, custom_id, name, description, price, image, category, stock, in_stock: stock > 0, deleted, created_at, updated_at }
    }

    pub fn id(&self) -> ProductId { self.id }
    pub fn custom_id(&self) -> Option<&str> { self.custom_id.as_deref() }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> Money { self.price }
    pub fn image(&self) -> &str { &self.image }
    pub fn category(&self) -> Category { self.category }
    pub fn stock(&self) -> u32 { self.stock }
    pub fn is_in_stock(&self) -> bool { self.in_stock }
    pub fn is_deleted(&self) -> bool { self.deleted }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn apply(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() { return Err(ProductError::MissingName); }
            self.name = name;
        }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(image) = patch.image { self.image = image; }
        if let Some(category) = patch.category { self.category = category; }
        if let Some(stock) = patch.stock { self.set_stock(stock); }
        self.touch();
        Ok(())
    }

    pub fn update_price(&mut self, new_price: Money) {
        self.price = new_price;
        self.touch();
    }

    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
        self.in_stock = stock > 0;
        self.touch();
    }

    /// Soft removal: the record stays for order history but no longer resolves.
    pub fn delete(&mut self) { self.deleted = true; self.touch(); }

    /// Puts a soft-deleted product back into the catalog.
    pub fn revive(&mut self) { self.deleted = false; self.touch(); }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
}

#[cfg(test)]
pub(crate) fn sample(name: &str, price: Money) -> NewProduct {
    NewProduct {
        custom_id: None, name: name.into(), description: String::new(), price,
        image: format!("https://img.example/{name}.jpg"), category: Category::Art, stock: 5,
    }
}
