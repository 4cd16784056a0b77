//! PostgreSQL store backed by sqlx

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ProductQuery, ProductSort, ShopStore};
use crate::domain::aggregates::{Cart, CartItem, Order, Product};
use crate::domain::value_objects::{Category, Money, OrderId, ProductId, UserId};
use crate::{Result, ShopError};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    custom_id: Option<String>,
    name: String,
    description: String,
    price: Decimal,
    image: String,
    category: String,
    stock: i32,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = ShopError;
    fn try_from(r: ProductRow) -> Result<Self> {
        let corrupt = |what: String| ShopError::StorageError(format!("product {}: {what}", r.id));
        let price = Money::new(r.price).map_err(|e| corrupt(e.to_string()))?;
        let category = r.category.parse::<Category>().map_err(|e| corrupt(e.to_string()))?;
        let stock = u32::try_from(r.stock).unwrap_or(0);
        Ok(Product::restore(
            ProductId::from_uuid(r.id), r.custom_id, r.name, r.description, price, r.image, category, stock,
            r.deleted, r.created_at, r.updated_at,
        ))
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

fn stock_column(product: &Product) -> i32 { i32::try_from(product.stock()).unwrap_or(i32::MAX) }

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: String,
    items: Json<Vec<CartItem>>,
    revision: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = ShopError;
    fn try_from(r: CartRow) -> Result<Self> {
        let revision = u64::try_from(r.revision).unwrap_or(0);
        Cart::restore(UserId::new(r.user_id.clone()), r.items.0, revision, r.updated_at)
            .map_err(|e| ShopError::StorageError(format!("cart of {}: {e}", r.user_id)))
    }
}

fn unique_violation(e: sqlx::Error) -> ShopError {
    if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
        return ShopError::Conflict;
    }
    e.into()
}

async fn write_cart<'e, E>(executor: E, cart: &Cart) -> Result<Cart>
where
    E: PgExecutor<'e>,
{
    let revision = i64::try_from(cart.revision()).map_err(|_| ShopError::Conflict)?;
    let items = Json(cart.items().to_vec());
    let written = if revision == 0 {
        sqlx::query("INSERT INTO carts (user_id, items, revision, updated_at) VALUES ($1, $2, 1, $3) ON CONFLICT (user_id) DO NOTHING")
            .bind(cart.user_id().as_str()).bind(items).bind(cart.updated_at())
            .execute(executor).await?
    } else {
        sqlx::query("UPDATE carts SET items = $2, revision = revision + 1, updated_at = $3 WHERE user_id = $1 AND revision = $4")
            .bind(cart.user_id().as_str()).bind(items).bind(cart.updated_at()).bind(revision)
            .execute(executor).await?
    };
    if written.rows_affected() == 0 { return Err(ShopError::Conflict); }
    let mut saved = cart.clone();
    saved.bump_revision();
    Ok(saved)
}

#[async_trait]
impl ShopStore for PgStore {
    async fn insert_product(&self, p: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, custom_id, name, description, price, image, category, stock, deleted, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)")
            .bind(p.id().as_uuid()).bind(p.custom_id()).bind(p.name()).bind(p.description()).bind(p.price().amount())
            .bind(p.image()).bind(p.category().as_str()).bind(stock_column(p)).bind(p.is_deleted())
            .bind(p.created_at()).bind(p.updated_at())
            .execute(&self.pool).await.map_err(unique_violation)?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<()> {
        let done = sqlx::query("UPDATE products SET custom_id = $2, name = $3, description = $4, price = $5, image = $6, category = $7, stock = $8, deleted = $9, updated_at = $10 WHERE id = $1")
            .bind(p.id().as_uuid()).bind(p.custom_id()).bind(p.name()).bind(p.description()).bind(p.price().amount())
            .bind(p.image()).bind(p.category().as_str()).bind(stock_column(p)).bind(p.is_deleted()).bind(p.updated_at())
            .execute(&self.pool).await.map_err(unique_violation)?;
        if done.rows_affected() == 0 { return Err(ShopError::ProductNotFound); }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids).fetch_all(&self.pool).await?;
        into_products(rows)
    }

    async fn find_by_custom_id(&self, custom_id: &str) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE custom_id = $1")
            .bind(custom_id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE deleted = FALSE AND lower(name) = lower($1) ORDER BY created_at")
            .bind(name).fetch_all(&self.pool).await?;
        into_products(rows)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE deleted = FALSE");
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));
            qb.push(" AND (name ILIKE ").push_bind(pattern.clone());
            qb.push(" OR description ILIKE ").push_bind(pattern).push(")");
        }
        if let Some(category) = query.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        qb.push(match query.sort {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY price ASC, created_at DESC, id DESC",
            ProductSort::PriceDesc => " ORDER BY price DESC, created_at DESC, id DESC",
        });
        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        into_products(rows)
    }

    async fn load_cart(&self, user: &UserId) -> Result<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1")
            .bind(user.as_str()).fetch_optional(&self.pool).await?;
        row.map(Cart::try_from).transpose()
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart> {
        write_cart(&self.pool, cart).await
    }

    async fn place_order(&self, order: &Order, cart: &Cart) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;
        let saved = write_cart(&mut *tx, cart).await?;
        sqlx::query("INSERT INTO orders (id, user_id, status, created_at, body) VALUES ($1, $2, $3, $4, $5)")
            .bind(order.id().as_uuid()).bind(order.user_id().as_str()).bind(order.status().as_str())
            .bind(order.created_at()).bind(Json(order))
            .execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let body = sqlx::query_scalar::<_, Json<Order>>("SELECT body FROM orders WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        Ok(body.map(|b| b.0))
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let done = sqlx::query("UPDATE orders SET status = $2, body = $3 WHERE id = $1")
            .bind(order.id().as_uuid()).bind(order.status().as_str()).bind(Json(order))
            .execute(&self.pool).await?;
        if done.rows_affected() == 0 { return Err(ShopError::OrderNotFound); }
        Ok(())
    }

    async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>> {
        let bodies = sqlx::query_scalar::<_, Json<Order>>("SELECT body FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.as_str()).fetch_all(&self.pool).await?;
        Ok(bodies.into_iter().map(|b| b.0).collect())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let bodies = sqlx::query_scalar::<_, Json<Order>>("SELECT body FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool).await?;
        Ok(bodies.into_iter().map(|b| b.0).collect())
    }
}
