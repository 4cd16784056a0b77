//! Persistence seam.
//!
//! Services only talk to [`ShopStore`]; the process picks one implementation
//! at startup and hands the same handle to every service.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::domain::aggregates::{Cart, Order, Product};
use crate::domain::value_objects::{Category, OrderId, ProductId, UserId};
use crate::{Result, ShopError};

#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, product: &Product) -> Result<()>;
    /// Looks up by internal id, soft-deleted products included.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;
    /// Exact, case-sensitive custom id match, soft-deleted products included.
    async fn find_by_custom_id(&self, custom_id: &str) -> Result<Option<Product>>;
    /// Case-insensitive exact name match over live products.
    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>>;
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;

    async fn load_cart(&self, user: &UserId) -> Result<Option<Cart>>;
    /// Writes `cart` if the stored revision still equals `cart.revision()`
    /// (zero for a cart never stored). Returns the cart with its new revision,
    /// or [`ShopError::Conflict`] when another write got there first.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart>;

    /// Inserts `order` and writes `cart` (under the same revision check as
    /// [`ShopStore::save_cart`]) as one unit.
    async fn place_order(&self, order: &Order, cart: &Cart) -> Result<Cart>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn update_order(&self, order: &Order) -> Result<()>;
    /// Newest first.
    async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>>;
    /// Newest first.
    async fn all_orders(&self) -> Result<Vec<Order>>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub sort: ProductSort,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl FromStr for ProductSort {
    type Err = ShopError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "newest" => Ok(Self::Newest),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            other => Err(ShopError::InvalidInput(format!("unknown sort '{other}'"))),
        }
    }
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        if product.is_deleted() { return false; }
        if let Some(category) = self.category {
            if product.category() != category { return false; }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                product.name().to_lowercase().contains(&term) || product.description().to_lowercase().contains(&term)
            }
            _ => true,
        }
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let newest = b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id()));
        match self.sort {
            ProductSort::Newest => newest,
            ProductSort::PriceAsc => a.price().cmp(&b.price()).then(newest),
            ProductSort::PriceDesc => b.price().cmp(&a.price()).then(newest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;
    use crate::domain::value_objects::Money;

    #[test]
    fn test_query_matching() {
        let mut p = Product::create(sample("Blade Runner", Money::whole(15))).unwrap();
        let q = ProductQuery { search: Some("runner".into()), ..Default::default() };
        assert!(q.matches(&p));
        let q = ProductQuery { category: Some(Category::Music), ..Default::default() };
        assert!(!q.matches(&p));
        p.delete();
        assert!(!ProductQuery::default().matches(&p));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("price-desc".parse::<ProductSort>().unwrap(), ProductSort::PriceDesc);
        assert!("cheapest".parse::<ProductSort>().is_err());
    }
}
