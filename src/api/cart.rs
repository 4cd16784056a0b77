//! Cart handlers; every route acts on the caller's own cart

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{AppState, CurrentUser, ValidJson};
use crate::domain::aggregates::Cart;
use crate::Result;

fn one() -> i64 { 1 }

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

pub async fn get(State(s): State<AppState>, CurrentUser(caller): CurrentUser) -> Result<Json<Cart>> {
    Ok(Json(s.carts.get(&caller.user_id).await?))
}

pub async fn add(
    State(s): State<AppState>, CurrentUser(caller): CurrentUser, ValidJson(r): ValidJson<AddToCartRequest>,
) -> Result<Json<Cart>> {
    Ok(Json(s.carts.add_item(&caller.user_id, &r.product_id, r.quantity).await?))
}

pub async fn update(
    State(s): State<AppState>, CurrentUser(caller): CurrentUser, Path(product_id): Path<String>,
    ValidJson(r): ValidJson<UpdateQuantityRequest>,
) -> Result<Json<Cart>> {
    Ok(Json(s.carts.update_quantity(&caller.user_id, &product_id, r.quantity).await?))
}

pub async fn remove(
    State(s): State<AppState>, CurrentUser(caller): CurrentUser, Path(product_id): Path<String>,
) -> Result<Json<Cart>> {
    Ok(Json(s.carts.remove_item(&caller.user_id, &product_id).await?))
}

pub async fn clear(State(s): State<AppState>, CurrentUser(caller): CurrentUser) -> Result<Json<Cart>> {
    Ok(Json(s.carts.clear(&caller.user_id).await?))
}
