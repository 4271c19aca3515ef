//! Task submission and review routes

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use common::models::{SubmissionKind, TaskSubmission};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, DbResultExt};
use crate::extract::{require_verified, AdminUser, CurrentUser};
use crate::state::AppState;
use engine::review::{ReviewDecision, SubmissionOutcome, SubmissionRequest};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: String,
    #[serde(default)]
    pub review_comment: Option<String>,
}

fn parse_kind(raw: &str) -> Result<SubmissionKind, ApiError> {
    match raw {
        "completed" => Ok(SubmissionKind::Completed),
        "unable" => Ok(SubmissionKind::Unable),
        "form" => Ok(SubmissionKind::Form),
        "text" => Ok(SubmissionKind::Text),
        other => Err(ApiError::BadRequest(format!(
            "Unknown submission kind: {}",
            other
        ))),
    }
}

/// Create a submission. The body is multipart: `mission_id` and `kind`
/// fields always, plus `text_content`, `form_answers` (JSON object) or a
/// `photo` file depending on the mission's task.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    require_verified(&user)?;

    let mut mission_id: Option<Uuid> = None;
    let mut kind: Option<SubmissionKind> = None;
    let mut text_content: Option<String> = None;
    let mut form_answers: Option<HashMap<String, String>> = None;
    let mut photo: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "mission_id" => {
                let raw = field.text().await.map_err(bad_field)?;
                mission_id = Some(
                    Uuid::parse_str(&raw)
                        .map_err(|_| ApiError::BadRequest("Invalid mission_id".to_string()))?,
                );
            }
            "kind" => {
                let raw = field.text().await.map_err(bad_field)?;
                kind = Some(parse_kind(&raw)?);
            }
            "text_content" => {
                text_content = Some(field.text().await.map_err(bad_field)?);
            }
            "form_answers" => {
                let raw = field.text().await.map_err(bad_field)?;
                form_answers = Some(serde_json::from_str(&raw).map_err(|_| {
                    ApiError::BadRequest("form_answers must be a JSON object".to_string())
                })?);
            }
            "photo" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("photo.jpg")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_field)?;
                photo = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let mission_id =
        mission_id.ok_or_else(|| ApiError::BadRequest("mission_id is required".to_string()))?;
    let kind = kind.ok_or_else(|| ApiError::BadRequest("kind is required".to_string()))?;

    let photo_url = match photo {
        Some((file_name, bytes)) => Some(store_photo(&state, &file_name, bytes).await?),
        None => None,
    };

    let outcome = state
        .review
        .submit(
            user.id,
            SubmissionRequest {
                mission_id,
                kind,
                text_content,
                form_answers,
                photo_url,
            },
        )
        .await?;

    let (status, body) = match outcome {
        SubmissionOutcome::Pending(submission) => (
            StatusCode::CREATED,
            serde_json::json!({
                "message": "Submission received and queued for review",
                "submission": submission,
            }),
        ),
        SubmissionOutcome::AutoApproved(submission) => (
            StatusCode::OK,
            serde_json::json!({
                "message": "No problem! Try this task again another day.",
                "submission": submission,
            }),
        ),
    };

    Ok((status, Json(body)))
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart field: {}", e))
}

/// Pass the photo through the temp dir on its way to object storage. The
/// temp file is removed eagerly; the sweeper catches any left by failures.
async fn store_photo(
    state: &Arc<AppState>,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Photo file is empty".to_string()));
    }

    let temp_dir = PathBuf::from(&state.config.temp_dir);
    tokio::fs::create_dir_all(&temp_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Temp dir unavailable: {}", e)))?;
    let temp_path = temp_dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
    tokio::fs::write(&temp_path, &bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Could not buffer upload: {}", e)))?;

    let uploaded = state
        .storage
        .upload(file_name, bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Photo upload failed: {}", e)));

    if tokio::fs::remove_file(&temp_path).await.is_err() {
        warn!("Could not remove temp file {:?}", temp_path);
    }

    Ok(uploaded?.url)
}

/// The caller's submissions, newest first
pub async fn mine(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<TaskSubmission>>> {
    let submissions = db::submissions::list_by_user(&state.pool, user.id)
        .await
        .db_err()?;
    Ok(Json(submissions))
}

/// The review queue
pub async fn pending(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Json<Vec<TaskSubmission>>> {
    let submissions = db::submissions::list_pending(&state.pool).await.db_err()?;
    Ok(Json(submissions))
}

/// Decide a pending submission
pub async fn review(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let decision = match req.status.as_str() {
        "approved" => ReviewDecision::Approve {
            comment: req.review_comment,
        },
        "rejected" => ReviewDecision::Reject {
            comment: req.review_comment,
        },
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid status: {} (expected approved or rejected)",
                other
            )))
        }
    };

    let outcome = state.review.review(id, admin.id, decision).await?;

    Ok(Json(serde_json::json!({
        "message": "Review recorded",
        "submission": outcome.submission,
        "mission_completed": outcome
            .completion
            .as_ref()
            .map(|c| c.mission_completed)
            .unwrap_or(false),
        "phase_completed": outcome
            .completion
            .as_ref()
            .map(|c| c.phase_completed)
            .unwrap_or(false),
    })))
}
