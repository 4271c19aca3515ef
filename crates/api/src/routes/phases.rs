//! Phase routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::models::Phase;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, DbResultExt, OptionExt};
use crate::extract::{AdminUser, CurrentUser};
use crate::state::AppState;
use engine::progression::PhaseStatus;

#[derive(Debug, Deserialize)]
pub struct CreatePhaseRequest {
    pub title: String,
    pub description: String,
    pub intro_video_url: String,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default = "default_required_level")]
    pub required_level: i32,
    #[serde(default)]
    pub experience_reward: i32,
    #[serde(default)]
    pub points_reward: i32,
    #[serde(default)]
    pub badge_url: Option<String>,
    #[serde(default)]
    pub badge_title: Option<String>,
    #[serde(default)]
    pub badge_description: Option<String>,
}

fn default_required_level() -> i32 {
    1
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePhaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub intro_video_url: Option<String>,
    pub required_level: Option<i32>,
    pub experience_reward: Option<i32>,
    pub points_reward: Option<i32>,
    pub badge_url: Option<String>,
    pub badge_title: Option<String>,
    pub badge_description: Option<String>,
    pub position: Option<i32>,
}

/// Create a phase (and its companion achievement)
pub async fn create(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreatePhaseRequest>,
) -> ApiResult<(StatusCode, Json<Phase>)> {
    for (field, value) in [
        ("title", &req.title),
        ("description", &req.description),
        ("intro_video_url", &req.intro_video_url),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{} is required", field)));
        }
    }

    let phase = db::phases::create(
        &state.pool,
        &db::phases::NewPhase {
            title: req.title,
            description: req.description,
            intro_video_url: req.intro_video_url,
            required_level: req.required_level,
            experience_reward: req.experience_reward,
            points_reward: req.points_reward,
            badge_url: req.badge_url,
            badge_title: req.badge_title,
            badge_description: req.badge_description,
        },
        req.position,
    )
    .await
    .db_err()?;

    Ok((StatusCode::CREATED, Json(phase)))
}

/// All active phases with the caller's unlock/completion annotations
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<PhaseStatus>>> {
    let statuses = state.progression.phase_statuses(&user).await?;
    Ok(Json(statuses))
}

/// One phase with its content counts
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let phase = db::phases::get(&state.pool, id)
        .await
        .db_err()?
        .not_found("Phase not found")?;
    let (missions_count, games_count) = db::phases::content_counts(&state.pool, id)
        .await
        .db_err()?;

    Ok(Json(serde_json::json!({
        "phase": phase,
        "missions_count": missions_count,
        "games_count": games_count,
    })))
}

/// Update phase fields and/or move it
pub async fn update(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePhaseRequest>,
) -> ApiResult<Json<Phase>> {
    let changes = db::phases::PhaseChanges {
        title: req.title,
        description: req.description,
        intro_video_url: req.intro_video_url,
        required_level: req.required_level,
        experience_reward: req.experience_reward,
        points_reward: req.points_reward,
        badge_url: req.badge_url,
        badge_title: req.badge_title,
        badge_description: req.badge_description,
        position: req.position,
    };

    db::phases::update(&state.pool, id, &changes)
        .await
        .db_err()?
        .not_found("Phase not found")
        .map(Json)
}

/// Soft-delete a phase
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = db::phases::deactivate(&state.pool, id).await.db_err()?;
    if !removed {
        return Err(ApiError::NotFound("Phase not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
