//! Mission routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::models::{Mission, MissionKind, MissionTask, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, DbResultExt, OptionExt};
use crate::extract::{require_verified, AdminUser, CurrentUser};
use crate::state::AppState;
use engine::progression::{CompletionSource, MissionStatus};

#[derive(Debug, Deserialize)]
pub struct CreateMissionRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub experience_reward: i32,
    #[serde(default)]
    pub points_reward: i32,
    pub task: MissionTask,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateMissionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub experience_reward: Option<i32>,
    pub points_reward: Option<i32>,
    pub task: Option<MissionTask>,
    pub position: Option<i32>,
    pub phase_id: Option<Uuid>,
}

/// Reward summary returned by completion endpoints
#[derive(Debug, Serialize)]
pub struct UserRewards {
    pub level: i32,
    pub experience: i64,
    pub total_points: i64,
}

impl From<&User> for UserRewards {
    fn from(user: &User) -> Self {
        Self {
            level: user.level,
            experience: user.total_experience,
            total_points: user.total_points,
        }
    }
}

/// The mission kind is derived from the task variant, never sent separately
fn kind_of(task: &MissionTask) -> MissionKind {
    match task {
        MissionTask::Video { .. } => MissionKind::Video,
        MissionTask::Photo { .. } => MissionKind::Photo,
        MissionTask::Games => MissionKind::Games,
        MissionTask::Form { .. } => MissionKind::Form,
        MissionTask::Text { .. } => MissionKind::Text,
    }
}

fn validate_task(task: &MissionTask) -> Result<(), ApiError> {
    match task {
        MissionTask::Video { video_url } if video_url.trim().is_empty() => Err(
            ApiError::BadRequest("video_url is required for video missions".to_string()),
        ),
        MissionTask::Form { questions } if questions.is_empty() => Err(ApiError::BadRequest(
            "Form missions need at least one question".to_string(),
        )),
        MissionTask::Text { min_words, max_words, .. } => {
            if *min_words < 1 || *max_words < *min_words {
                return Err(ApiError::BadRequest(
                    "Text missions need 1 <= min_words <= max_words".to_string(),
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Create a mission within a phase
pub async fn create(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(phase_id): Path<Uuid>,
    Json(req): Json<CreateMissionRequest>,
) -> ApiResult<(StatusCode, Json<Mission>)> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "title and description are required".to_string(),
        ));
    }
    validate_task(&req.task)?;

    db::phases::get(&state.pool, phase_id)
        .await
        .db_err()?
        .not_found("Phase not found")?;

    let mission = db::missions::create(
        &state.pool,
        phase_id,
        &db::missions::NewMission {
            kind: kind_of(&req.task),
            title: req.title,
            description: req.description,
            experience_reward: req.experience_reward,
            points_reward: req.points_reward,
            task: req.task,
        },
        req.position,
    )
    .await
    .db_err()?;

    Ok((StatusCode::CREATED, Json(mission)))
}

/// Active missions of a phase with the caller's unlock/completion flags
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(phase_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MissionStatus>>> {
    db::phases::get(&state.pool, phase_id)
        .await
        .db_err()?
        .not_found("Phase not found")?;

    let statuses = state.progression.mission_statuses(user.id, phase_id).await?;
    Ok(Json(statuses))
}

/// Update mission fields and/or move it (possibly across phases)
pub async fn update(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMissionRequest>,
) -> ApiResult<Json<Mission>> {
    if let Some(ref task) = req.task {
        validate_task(task)?;
    }
    if let Some(destination) = req.phase_id {
        db::phases::get(&state.pool, destination)
            .await
            .db_err()?
            .not_found("Destination phase not found")?;
    }

    let changes = db::missions::MissionChanges {
        title: req.title,
        description: req.description,
        experience_reward: req.experience_reward,
        points_reward: req.points_reward,
        kind: req.task.as_ref().map(kind_of),
        task: req.task,
        position: req.position,
        phase_id: req.phase_id,
    };

    db::missions::update(&state.pool, id, &changes)
        .await
        .db_err()?
        .not_found("Mission not found")
        .map(Json)
}

/// Soft-delete a mission
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = db::missions::deactivate(&state.pool, id).await.db_err()?;
    if !removed {
        return Err(ApiError::NotFound("Mission not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Directly complete a video or games mission
pub async fn complete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_verified(&user)?;

    let outcome = state
        .progression
        .complete_mission(user.id, id, CompletionSource::Player)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Mission completed!",
        "mission_completed": outcome.mission_completed,
        "phase_completed": outcome.phase_completed,
        "user": UserRewards::from(&outcome.user),
        "new_achievements": outcome.new_achievements,
    })))
}
