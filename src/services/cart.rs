//! Cart operations with optimistic concurrency on the stored revision

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::bus::EventBus;
use crate::domain::aggregates::Cart;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{ProductId, Quantity, UserId};
use crate::services::CatalogService;
use crate::store::ShopStore;
use crate::{Result, ShopError};

/// Attempts per mutation before a revision conflict reaches the caller
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn ShopStore>,
    catalog: CatalogService,
    bus: EventBus,
}

impl CartService {
    pub fn new(store: Arc<dyn ShopStore>, catalog: CatalogService, bus: EventBus) -> Self {
        Self { store, catalog, bus }
    }

    /// The user's cart, or an empty unsaved one.
    pub async fn get(&self, user: &UserId) -> Result<Cart> {
        Ok(self.store.load_cart(user).await?.unwrap_or_else(|| Cart::new(user.clone())))
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, user: &UserId, product_id: &str, quantity: i64) -> Result<Cart> {
        let quantity = Quantity::new(quantity)?;
        let product = self.catalog.resolve(product_id).await?;
        self.mutate(user, |cart| {
            cart.add_item(&product, quantity)?;
            Ok(true)
        })
        .await
    }

    /// Sets the line quantity exactly; zero or below removes the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, user: &UserId, product_id: &str, quantity: i64) -> Result<Cart> {
        let cart = self.get(user).await?;
        let id = self.locate(&cart, product_id).await?.ok_or(ShopError::ItemNotFound)?;
        self.mutate(user, |cart| {
            cart.update_quantity(id, quantity)?;
            Ok(true)
        })
        .await
    }

    /// Idempotent: removing an absent line returns the cart unchanged.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user: &UserId, product_id: &str) -> Result<Cart> {
        let cart = self.get(user).await?;
        match self.locate(&cart, product_id).await? {
            Some(id) => self.mutate(user, |cart| Ok(cart.remove_item(id)?)).await,
            None => Ok(cart),
        }
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, user: &UserId) -> Result<Cart> {
        let cart = self
            .mutate(user, |cart| {
                if cart.is_empty() { return Ok(false); }
                cart.clear();
                Ok(true)
            })
            .await?;
        self.bus.publish(DomainEvent::Cart(CartEvent::Cleared { user_id: user.clone() })).await;
        Ok(cart)
    }

    /// Maps a caller-supplied id onto a line in `cart`: the internal id of a
    /// line already present, or whatever the catalog resolves it to.
    async fn locate(&self, cart: &Cart, raw: &str) -> Result<Option<ProductId>> {
        if let Some(id) = ProductId::parse(raw).filter(|id| cart.contains(*id)) {
            return Ok(Some(id));
        }
        match self.catalog.resolve(raw).await {
            Ok(product) => Ok(Some(product.id()).filter(|id| cart.contains(*id))),
            Err(ShopError::ProductNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read-modify-write against the store. `apply` returns whether it changed
    /// the cart; unchanged carts are not written.
    async fn mutate<F>(&self, user: &UserId, mut apply: F) -> Result<Cart>
    where
        F: FnMut(&mut Cart) -> Result<bool> + Send,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut cart = self.get(user).await?;
            if !apply(&mut cart)? { return Ok(cart); }
            match self.store.save_cart(&cart).await {
                Ok(saved) => {
                    debug!(revision = saved.revision(), total = %saved.total(), "cart saved");
                    self.bus.publish(DomainEvent::Cart(CartEvent::Changed {
                        user_id: user.clone(), item_count: saved.item_count(), total: saved.total(),
                    })).await;
                    return Ok(saved);
                }
                Err(ShopError::Conflict) => warn!(attempt, "cart revision conflict, retrying"),
                Err(e) => return Err(e),
            }
        }
        Err(ShopError::Conflict)
    }
}
