//! Achievement queries

use chrono::{DateTime, Utc};
use common::models::{Achievement, UserAchievement};
use sqlx::PgPool;
use uuid::Uuid;

/// All active achievement definitions
pub async fn list_active(pool: &PgPool) -> Result<Vec<Achievement>, sqlx::Error> {
    sqlx::query_as::<_, Achievement>(
        "SELECT * FROM achievements WHERE is_active ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

/// Active definitions the user has not unlocked yet — the evaluator's input
pub async fn list_active_not_owned(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Achievement>, sqlx::Error> {
    sqlx::query_as::<_, Achievement>(
        r#"
        SELECT a.* FROM achievements a
        LEFT JOIN user_achievements ua
            ON ua.achievement_id = a.id AND ua.user_id = $1
        WHERE a.is_active AND ua.achievement_id IS NULL
        ORDER BY a.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Unlock an achievement for a user. Returns `false` when already owned,
/// so the points grant runs once.
pub async fn unlock(
    pool: &PgPool,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_achievements (user_id, achievement_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, achievement_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(achievement_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// All achievements unlocked by a user, with definition details
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<UserAchievement>, sqlx::Error> {
    sqlx::query_as::<_, UserAchievement>(
        r#"
        SELECT ua.user_id, ua.achievement_id, ua.unlocked_at,
               a.title, a.description, a.icon
        FROM user_achievements ua
        JOIN achievements a ON a.id = ua.achievement_id
        WHERE ua.user_id = $1
        ORDER BY ua.unlocked_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// An unlock awaiting push/email delivery
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnlockNotification {
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub achievement_id: Uuid,
    pub achievement_title: String,
    pub achievement_description: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Unlocks not yet notified, oldest first
pub async fn pending_notifications(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<UnlockNotification>, sqlx::Error> {
    sqlx::query_as::<_, UnlockNotification>(
        r#"
        SELECT ua.user_id, u.email AS user_email, u.name AS user_name,
               ua.achievement_id, a.title AS achievement_title,
               a.description AS achievement_description, ua.unlocked_at
        FROM user_achievements ua
        JOIN users u ON u.id = ua.user_id
        JOIN achievements a ON a.id = ua.achievement_id
        WHERE ua.notified_at IS NULL
        ORDER BY ua.unlocked_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Mark an unlock as notified
pub async fn mark_notified(
    pool: &PgPool,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE user_achievements
        SET notified_at = NOW()
        WHERE user_id = $1 AND achievement_id = $2
        "#,
    )
    .bind(user_id)
    .bind(achievement_id)
    .execute(pool)
    .await?;

    Ok(())
}
