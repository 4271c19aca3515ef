//! Request identity extractors
//!
//! Authentication is handled upstream (gateway middleware); requests reach
//! this service with the caller's id in the `x-user-id` header. The
//! extractors resolve it to a user row and enforce role/verification
//! gates.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use common::models::{User, UserRole};
use uuid::Uuid;

use crate::error::{ApiError, DbResultExt, OptionExt};
use crate::state::AppState;

const USER_HEADER: &str = "x-user-id";

/// Any authenticated user
pub struct CurrentUser(pub User);

/// An authenticated admin
pub struct AdminUser(pub User);

async fn resolve_user(parts: &mut Parts, state: &Arc<AppState>) -> Result<User, ApiError> {
    let raw = parts
        .headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {} header", USER_HEADER)))?;

    let id = Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} header", USER_HEADER)))?;

    db::users::get_by_id(&state.pool, id)
        .await
        .db_err()?
        .not_found("User not found")
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_user(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

/// Gate for actions that need a verified account
pub fn require_verified(user: &User) -> Result<(), ApiError> {
    if user.is_verified {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Verify your account to do this".to_string(),
        ))
    }
}
