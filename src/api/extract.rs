//! Request extractors: bearer-token identity and validated JSON bodies

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::Validate;

use super::AppState;
use crate::auth::{Caller, JwtService};
use crate::ShopError;

/// Any authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(Self(caller.clone()));
        }
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_from_header)
            .ok_or(ShopError::Unauthorized)?;
        let caller = state.jwt.verify(token).map_err(|e| {
            warn!(uri = %parts.uri, error = %e, "bearer token rejected");
            ShopError::Unauthorized
        })?;
        parts.extensions.insert(caller.clone());
        Ok(Self(caller))
    }
}

/// An authenticated caller holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(caller) = CurrentUser::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            warn!(user = %caller.user_id, uri = %parts.uri, "admin route refused");
            return Err(ShopError::Forbidden);
        }
        Ok(Self(caller))
    }
}

/// JSON body that has passed its `validator` rules
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ShopError::InvalidInput(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
