//! Product catalog: id resolution, listing, admin edits and imports

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::bus::EventBus;
use crate::domain::aggregates::{NewProduct, Product, ProductError, ProductPatch};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Category, Money, ProductId};
use crate::store::{ProductQuery, ShopStore};
use crate::{Result, ShopError};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ShopStore>,
    bus: EventBus,
}

/// One externally-sourced catalog record, keyed by its custom id
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub custom_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub image: String,
    pub category: Category,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ShopStore>, bus: EventBus) -> Self { Self { store, bus } }

    /// Resolves an opaque identifier: custom id first, then internal id, then
    /// case-insensitive name. Soft-deleted products never resolve.
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw: &str) -> Result<Product> {
        if let Some(p) = self.store.find_by_custom_id(raw).await? {
            if !p.is_deleted() { return Ok(p); }
        }
        if let Some(id) = ProductId::parse(raw) {
            if let Some(p) = self.store.get_product(id).await? {
                if !p.is_deleted() { return Ok(p); }
            }
        }
        let mut by_name = self.store.find_by_name(raw).await?;
        match by_name.len() {
            0 => Err(ShopError::ProductNotFound),
            1 => {
                warn!(id = raw, "product resolved by name; callers should use a canonical id");
                Ok(by_name.remove(0))
            }
            n => {
                warn!(id = raw, matches = n, "ambiguous product name");
                Err(ShopError::AmbiguousProduct(raw.to_string()))
            }
        }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.store.list_products(query).await
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewProduct) -> Result<Product> {
        if let Some(cid) = new.custom_id.as_deref().filter(|c| !c.is_empty()) {
            if self.store.find_by_custom_id(cid).await?.is_some() {
                return Err(ShopError::InvalidInput(format!("custom id '{cid}' is already in use")));
            }
        }
        let product = Product::create(new)?;
        self.store.insert_product(&product).await?;
        info!(product_id = %product.id(), "product created");
        self.bus.publish(DomainEvent::Product(ProductEvent::Created {
            product_id: product.id(), custom_id: product.custom_id().map(str::to_string),
        })).await;
        Ok(product)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, raw: &str, patch: ProductPatch) -> Result<Product> {
        let mut product = self.resolve(raw).await?;
        product.apply(patch)?;
        self.store.update_product(&product).await?;
        self.bus.publish(DomainEvent::Product(ProductEvent::Updated { product_id: product.id() })).await;
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, raw: &str) -> Result<()> {
        let mut product = self.resolve(raw).await?;
        product.delete();
        self.store.update_product(&product).await?;
        info!(product_id = %product.id(), "product removed from catalog");
        self.bus.publish(DomainEvent::Product(ProductEvent::Deleted { product_id: product.id() })).await;
        Ok(())
    }

    /// Upserts each record by custom id. Running the same import twice leaves
    /// the catalog unchanged apart from `updated_at`. Soft-deleted products
    /// named by a record are put back on sale.
    ///
    /// The whole batch is checked before anything is written; one bad record
    /// rejects the import.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn import(&self, records: Vec<ImportRecord>) -> Result<ImportReport> {
        let mut seen = HashSet::new();
        let mut planned = Vec::with_capacity(records.len());
        for (n, record) in records.into_iter().enumerate() {
            let custom_id = record.custom_id.trim().to_string();
            if custom_id.is_empty() {
                return Err(ShopError::InvalidInput(format!("record {n} ('{}') has no custom id", record.name)));
            }
            if !seen.insert(custom_id.clone()) {
                return Err(ShopError::InvalidInput(format!("custom id '{custom_id}' appears more than once")));
            }
            let invalid = |e: ProductError| ShopError::InvalidInput(format!("record {n} ('{custom_id}'): {e}"));
            let step = match self.store.find_by_custom_id(&custom_id).await? {
                Some(mut existing) => {
                    existing.apply(ProductPatch {
                        name: Some(record.name), description: Some(record.description), price: Some(record.price),
                        image: Some(record.image), category: Some(record.category), stock: Some(record.stock),
                    }).map_err(invalid)?;
                    if existing.is_deleted() { existing.revive(); }
                    Upsert::Update(existing)
                }
                None => Upsert::Create(Product::create(NewProduct {
                    custom_id: Some(custom_id.clone()), name: record.name, description: record.description,
                    price: record.price, image: record.image, category: record.category, stock: record.stock,
                }).map_err(invalid)?),
            };
            planned.push(step);
        }

        let mut report = ImportReport::default();
        for step in planned {
            let event = match step {
                Upsert::Create(product) => {
                    self.store.insert_product(&product).await?;
                    report.created += 1;
                    ProductEvent::Created { product_id: product.id(), custom_id: product.custom_id().map(str::to_string) }
                }
                Upsert::Update(product) => {
                    self.store.update_product(&product).await?;
                    report.updated += 1;
                    ProductEvent::Updated { product_id: product.id() }
                }
            };
            self.bus.publish(DomainEvent::Product(event)).await;
        }
        info!(created = report.created, updated = report.updated, "catalog import finished");
        Ok(report)
    }
}

enum Upsert {
    Create(Product),
    Update(Product),
}
