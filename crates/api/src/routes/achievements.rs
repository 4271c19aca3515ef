//! Achievement routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::models::{Achievement, UserAchievement};
use uuid::Uuid;

use crate::error::{ApiResult, DbResultExt};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// All active achievement definitions
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<Vec<Achievement>>> {
    let achievements = db::achievements::list_active(&state.pool).await.db_err()?;
    Ok(Json(achievements))
}

/// Achievements unlocked by a user
pub async fn for_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserAchievement>>> {
    let unlocked = db::achievements::list_for_user(&state.pool, user_id)
        .await
        .db_err()?;
    Ok(Json(unlocked))
}
