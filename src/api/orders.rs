//! Checkout and order handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{AppState, CurrentUser, ValidJson};
use crate::domain::aggregates::{Order, OrderStatus, PaymentResult, ShippingAddress};
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressRequest {
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[validate]
    pub shipping_address: ShippingAddressRequest,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[validate(length(min = 1, max = 200))]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub update_time: String,
    #[validate(email)]
    pub email_address: Option<String>,
}

pub async fn place(
    State(s): State<AppState>, CurrentUser(caller): CurrentUser, ValidJson(r): ValidJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let a = r.shipping_address;
    let address = ShippingAddress { address: a.address, city: a.city, postal_code: a.postal_code, country: a.country };
    let order = s.orders.place(&caller.user_id, address, &r.payment_method).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn mine(State(s): State<AppState>, CurrentUser(caller): CurrentUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders.list_mine(&caller.user_id).await?))
}

pub async fn list_all(State(s): State<AppState>, CurrentUser(caller): CurrentUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders.list_all(&caller).await?))
}

pub async fn get(State(s): State<AppState>, CurrentUser(caller): CurrentUser, Path(id): Path<String>) -> Result<Json<Order>> {
    Ok(Json(s.orders.get(&caller, &id).await?))
}

pub async fn set_status(
    State(s): State<AppState>, CurrentUser(caller): CurrentUser, Path(id): Path<String>,
    ValidJson(r): ValidJson<StatusRequest>,
) -> Result<Json<Order>> {
    let status: OrderStatus = r.status.parse()?;
    Ok(Json(s.orders.set_status(&caller, &id, status).await?))
}

pub async fn pay(
    State(s): State<AppState>, CurrentUser(caller): CurrentUser, Path(id): Path<String>,
    ValidJson(r): ValidJson<PaymentRequest>,
) -> Result<Json<Order>> {
    let payment = PaymentResult {
        id: r.id, status: r.status, update_time: r.update_time, email_address: r.email_address.unwrap_or_default(),
    };
    Ok(Json(s.orders.mark_paid(&caller, &id, payment).await?))
}
