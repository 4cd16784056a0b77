//! Catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{AdminUser, AppState, ValidJson};
use crate::domain::aggregates::{NewProduct, Product, ProductPatch};
use crate::domain::value_objects::{Category, Money};
use crate::services::{ImportRecord, ImportReport};
use crate::store::ProductQuery;
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

impl TryFrom<ListParams> for ProductQuery {
    type Error = crate::ShopError;
    fn try_from(p: ListParams) -> Result<Self> {
        let category = match p.category.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(c) => Some(c.parse::<Category>()?),
        };
        Ok(ProductQuery {
            search: p.search.filter(|s| !s.trim().is_empty()),
            category,
            sort: p.sort.as_deref().unwrap_or_default().parse()?,
        })
    }
}

pub async fn list(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<Vec<Product>>> {
    let query = ProductQuery::try_from(p)?;
    Ok(Json(s.catalog.list(&query).await?))
}

pub async fn get(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    Ok(Json(s.catalog.resolve(&id).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 128))]
    pub custom_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[validate(length(max = 2048))]
    #[serde(default)]
    pub image: String,
    pub category: Category,
    #[serde(default)]
    pub stock: u32,
}

pub async fn create(
    State(s): State<AppState>, AdminUser(_admin): AdminUser, ValidJson(r): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = s.catalog.create(NewProduct {
        custom_id: r.custom_id, name: r.name, description: r.description, price: r.price,
        image: r.image, category: r.category, stock: r.stock,
    }).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub price: Option<Money>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
    pub category: Option<Category>,
    pub stock: Option<u32>,
}

pub async fn update(
    State(s): State<AppState>, AdminUser(_admin): AdminUser, Path(id): Path<String>,
    ValidJson(r): ValidJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let patch = ProductPatch {
        name: r.name, description: r.description, price: r.price, image: r.image, category: r.category, stock: r.stock,
    };
    Ok(Json(s.catalog.update(&id, patch).await?))
}

pub async fn delete(State(s): State<AppState>, AdminUser(_admin): AdminUser, Path(id): Path<String>) -> Result<StatusCode> {
    s.catalog.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 10000))]
    pub products: Vec<ImportRecord>,
}

pub async fn import(
    State(s): State<AppState>, AdminUser(_admin): AdminUser, ValidJson(r): ValidJson<ImportRequest>,
) -> Result<Json<ImportReport>> {
    Ok(Json(s.catalog.import(r.products).await?))
}
