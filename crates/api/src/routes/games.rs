//! Game routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::models::{Game, MissionKind};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, DbResultExt, OptionExt};
use crate::extract::{require_verified, AdminUser, CurrentUser};
use crate::routes::missions::UserRewards;
use crate::state::AppState;
use engine::progression::{GameStatus, ScoreOutcome};

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub title: String,
    pub points: i32,
    #[serde(default)]
    pub max_attempts: i32,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateGameRequest {
    pub title: Option<String>,
    pub points: Option<i32>,
    pub max_attempts: Option<i32>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub score: i32,
}

/// Create a game within a games-type mission
pub async fn create(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(mission_id): Path<Uuid>,
    Json(req): Json<CreateGameRequest>,
) -> ApiResult<(StatusCode, Json<Game>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if req.points < 1 {
        return Err(ApiError::BadRequest("points must be positive".to_string()));
    }
    if req.max_attempts < 0 {
        return Err(ApiError::BadRequest(
            "max_attempts must be zero (unlimited) or positive".to_string(),
        ));
    }

    let mission = db::missions::get(&state.pool, mission_id)
        .await
        .db_err()?
        .not_found("Mission not found")?;
    if mission.kind != MissionKind::Games {
        return Err(ApiError::BadRequest(
            "Games can only be added to a games mission".to_string(),
        ));
    }

    let game = db::games::create(
        &state.pool,
        mission.id,
        mission.phase_id,
        &db::games::NewGame {
            title: req.title,
            points: req.points,
            max_attempts: req.max_attempts,
        },
        req.position,
    )
    .await
    .db_err()?;

    Ok((StatusCode::CREATED, Json(game)))
}

/// Active games of a mission with the caller's unlock/completion flags
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(mission_id): Path<Uuid>,
) -> ApiResult<Json<Vec<GameStatus>>> {
    let statuses = state.progression.game_statuses(user.id, mission_id).await?;
    Ok(Json(statuses))
}

/// Update game fields and/or move it within its mission
pub async fn update(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGameRequest>,
) -> ApiResult<Json<Game>> {
    let changes = db::games::GameChanges {
        title: req.title,
        points: req.points,
        max_attempts: req.max_attempts,
        position: req.position,
    };

    db::games::update(&state.pool, id, &changes)
        .await
        .db_err()?
        .not_found("Game not found")
        .map(Json)
}

/// Soft-delete a game
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = db::games::deactivate(&state.pool, id).await.db_err()?;
    if !removed {
        return Err(ApiError::NotFound("Game not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a score for a game
pub async fn submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitScoreRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_verified(&user)?;

    let outcome = state
        .progression
        .submit_game_score(user.id, id, req.score)
        .await?;

    let body = match outcome {
        ScoreOutcome::Failed { attempt, threshold } => serde_json::json!({
            "message": format!("Score below the passing threshold of {}", threshold),
            "passed": false,
            "required_score": threshold,
            "progress": attempt,
        }),
        ScoreOutcome::Passed {
            attempt,
            user,
            mission_completed,
            phase_completed,
            new_achievements,
        } => serde_json::json!({
            "message": "Game completed!",
            "passed": true,
            "progress": attempt,
            "user": UserRewards::from(&user),
            "mission_completed": mission_completed,
            "phase_completed": phase_completed,
            "new_achievements": new_achievements,
        }),
    };

    Ok(Json(body))
}
