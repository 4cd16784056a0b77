//! In-process store used for local runs and tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ProductQuery, ShopStore};
use crate::domain::aggregates::{Cart, Order, Product};
use crate::domain::value_objects::{OrderId, ProductId, UserId};
use crate::{Result, ShopError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

impl Inner {
    fn custom_id_taken(&self, product: &Product) -> bool {
        product.custom_id().is_some_and(|cid| {
            self.products.values().any(|p| p.id() != product.id() && p.custom_id() == Some(cid))
        })
    }

    fn write_cart(&mut self, cart: &Cart) -> Result<Cart> {
        let stored = self.carts.get(cart.user_id()).map_or(0, Cart::revision);
        if stored != cart.revision() { return Err(ShopError::Conflict); }
        let mut saved = cart.clone();
        saved.bump_revision();
        self.carts.insert(saved.user_id().clone(), saved.clone());
        Ok(saved)
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.custom_id_taken(product) || inner.products.contains_key(&product.id()) {
            return Err(ShopError::Conflict);
        }
        inner.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product.id()) { return Err(ShopError::ProductNotFound); }
        if inner.custom_id_taken(product) { return Err(ShopError::Conflict); }
        inner.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.products.get(id).cloned()).collect())
    }

    async fn find_by_custom_id(&self, custom_id: &str) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.values().find(|p| p.custom_id() == Some(custom_id)).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>> {
        let wanted = name.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .filter(|p| !p.is_deleted() && p.name().to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner.products.values().filter(|p| query.matches(p)).cloned().collect();
        products.sort_by(|a, b| query.compare(a, b));
        Ok(products)
    }

    async fn load_cart(&self, user: &UserId) -> Result<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(user).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart> {
        self.inner.write().await.write_cart(cart)
    }

    async fn place_order(&self, order: &Order, cart: &Cart) -> Result<Cart> {
        let mut inner = self.inner.write().await;
        let saved = inner.write_cart(cart)?;
        inner.orders.insert(order.id(), order.clone());
        Ok(saved)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.orders.get_mut(&order.id()) {
            Some(stored) => { *stored = order.clone(); Ok(()) }
            None => Err(ShopError::OrderNotFound),
        }
    }

    async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner.orders.values().filter(|o| o.is_owned_by(user)).cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.inner.read().await.orders.values().cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;
    use crate::domain::value_objects::{Money, Quantity};

    #[tokio::test]
    async fn test_stale_cart_write_is_rejected() {
        let store = MemoryStore::new();
        let p = Product::create(sample("P1", Money::whole(10))).unwrap();
        let user = UserId::new("u1");

        let saved = store.save_cart(&Cart::new(user.clone())).await.unwrap();
        assert_eq!(saved.revision(), 1);

        // two writers read revision 1
        let mut first = store.load_cart(&user).await.unwrap().unwrap();
        let mut second = first.clone();
        first.add_item(&p, Quantity::ONE).unwrap();
        second.add_item(&p, Quantity::new(2).unwrap()).unwrap();

        assert_eq!(store.save_cart(&first).await.unwrap().revision(), 2);
        assert!(matches!(store.save_cart(&second).await, Err(ShopError::Conflict)));
        let stored = store.load_cart(&user).await.unwrap().unwrap();
        assert_eq!(stored.items()[0].quantity.value(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_custom_id_rejected() {
        let store = MemoryStore::new();
        let mut a = sample("A", Money::whole(1));
        a.custom_id = Some("ext-1".into());
        let mut b = sample("B", Money::whole(1));
        b.custom_id = Some("ext-1".into());
        store.insert_product(&Product::create(a).unwrap()).await.unwrap();
        assert!(matches!(store.insert_product(&Product::create(b).unwrap()).await, Err(ShopError::Conflict)));
    }
}
