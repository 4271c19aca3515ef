//! Task submission queries

use common::models::{SubmissionKind, SubmissionPayload, SubmissionStatus, TaskSubmission};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Fields for creating a submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub phase_id: Uuid,
    pub kind: SubmissionKind,
    pub payload: Option<SubmissionPayload>,
    pub photo_url: Option<String>,
    pub status: SubmissionStatus,
}

/// True when a pending or approved submission already exists for
/// (user, mission) — new submissions are rejected while one does.
/// Auto-approved 'unable' submissions don't count; the user may try again.
pub async fn has_blocking(
    pool: &PgPool,
    user_id: Uuid,
    mission_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM task_submissions
            WHERE user_id = $1 AND mission_id = $2
              AND (status = 'pending' OR (status = 'approved' AND kind <> 'unable'))
        )
        "#,
    )
    .bind(user_id)
    .bind(mission_id)
    .fetch_one(pool)
    .await
}

/// Insert a submission
pub async fn create(pool: &PgPool, new: &NewSubmission) -> Result<TaskSubmission, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(
        r#"
        INSERT INTO task_submissions (id, user_id, mission_id, phase_id, kind, payload, photo_url, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.mission_id)
    .bind(new.phase_id)
    .bind(new.kind)
    .bind(new.payload.as_ref().map(Json))
    .bind(new.photo_url.as_deref())
    .bind(new.status)
    .fetch_one(pool)
    .await
}

/// Get a submission by id
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>("SELECT * FROM task_submissions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Pending submissions, oldest first (the review queue)
pub async fn list_pending(pool: &PgPool) -> Result<Vec<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(
        "SELECT * FROM task_submissions WHERE status = 'pending' ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

/// A user's submissions, newest first
pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(
        "SELECT * FROM task_submissions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Apply a review decision to a pending submission. The `status =
/// 'pending'` guard makes approved/rejected terminal: a second decision
/// matches no row and returns `None`.
pub async fn decide(
    pool: &PgPool,
    id: Uuid,
    status: SubmissionStatus,
    reviewer_id: Uuid,
    comment: Option<&str>,
) -> Result<Option<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(
        r#"
        UPDATE task_submissions
        SET status = $2, reviewed_by = $3, reviewed_at = NOW(), review_comment = $4
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(reviewer_id)
    .bind(comment)
    .fetch_optional(pool)
    .await
}
