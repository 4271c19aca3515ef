//! User routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::models::{User, UserRole};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, DbResultExt, OptionExt};
use crate::extract::{AdminUser, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetBadgeRequest {
    pub badge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub token: String,
}

/// Provision a user account
pub async fn create(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if req.email.trim().is_empty() || req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "email and name are required".to_string(),
        ));
    }

    let role = if req.admin {
        UserRole::Admin
    } else {
        UserRole::Player
    };
    let user = db::users::create(&state.pool, req.email.trim(), req.name.trim(), role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ApiError::BadRequest("Email already registered".to_string())
            }
            other => ApiError::Database(other.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// The caller's profile with progression counters
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<serde_json::Value>> {
    let stats = db::users::progress_stats(&state.pool, user.id)
        .await
        .db_err()?;

    Ok(Json(serde_json::json!({
        "user": user,
        "stats": {
            "games_completed": stats.games_completed,
            "missions_completed": stats.missions_completed,
            "phases_completed": stats.phases_completed,
        },
    })))
}

/// Choose the active badge among badges actually earned; `null` clears it
pub async fn set_badge(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SetBadgeRequest>,
) -> ApiResult<Json<User>> {
    if let Some(ref badge) = req.badge {
        let earned = db::users::earned_badges(&state.pool, user.id)
            .await
            .db_err()?;
        if !earned.iter().any(|b| b == badge) {
            return Err(ApiError::BadRequest(
                "You have not earned that badge".to_string(),
            ));
        }
    }

    db::users::set_active_badge(&state.pool, user.id, req.badge.as_deref())
        .await
        .db_err()?
        .not_found("User not found")
        .map(Json)
}

/// Register a device token for push notifications
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<RegisterDeviceRequest>,
) -> ApiResult<StatusCode> {
    if req.token.trim().is_empty() {
        return Err(ApiError::BadRequest("token is required".to_string()));
    }
    db::devices::register(&state.pool, user.id, req.token.trim())
        .await
        .db_err()?;
    Ok(StatusCode::CREATED)
}

/// Remove a device token
pub async fn remove_device(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    db::devices::remove_token(&state.pool, &token).await.db_err()?;
    Ok(StatusCode::NO_CONTENT)
}
