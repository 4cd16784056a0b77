//! Maps [`ShopError`] onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::ShopError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ShopError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ProductNotFound => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            Self::ItemNotFound => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND"),
            Self::OrderNotFound => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            Self::AmbiguousProduct(_) => (StatusCode::CONFLICT, "AMBIGUOUS_PRODUCT"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            Self::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_CART"),
            Self::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::AlreadyPaid => (StatusCode::CONFLICT, "ALREADY_PAID"),
            Self::OrderCancelled => (StatusCode::CONFLICT, "ORDER_CANCELLED"),
            Self::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            Self::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            Self::StorageError(detail) => {
                error!(error = %detail, "storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { code: code.to_string(), message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_details_are_hidden() {
        let resp = ShopError::StorageError("connection refused to 10.0.0.5".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ShopError::EmptyCart.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ShopError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ShopError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(ShopError::ProductNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ShopError::OrderCancelled.into_response().status(), StatusCode::CONFLICT);
    }
}
