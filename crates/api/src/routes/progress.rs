//! Per-phase progress routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::models::UserProgress;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{require_verified, CurrentUser};
use crate::state::AppState;

/// Mark the phase intro video watched (idempotent)
pub async fn video_watched(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(phase_id): Path<Uuid>,
) -> ApiResult<Json<UserProgress>> {
    require_verified(&user)?;

    let progress = state
        .progression
        .mark_video_watched(user.id, phase_id)
        .await?;
    Ok(Json(progress))
}

/// The caller's progress ledger for a phase, if started
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(phase_id): Path<Uuid>,
) -> ApiResult<Json<Option<UserProgress>>> {
    let progress = state.progression.progress(user.id, phase_id).await?;
    Ok(Json(progress))
}
