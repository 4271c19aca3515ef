//! Phase queries

use common::models::{AchievementKind, Phase};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ordering::{self, Scope};

/// Fields for creating a phase
#[derive(Debug, Clone)]
pub struct NewPhase {
    pub title: String,
    pub description: String,
    pub intro_video_url: String,
    pub required_level: i32,
    pub experience_reward: i32,
    pub points_reward: i32,
    pub badge_url: Option<String>,
    pub badge_title: Option<String>,
    pub badge_description: Option<String>,
}

/// Optional field updates; `position` requests a move-with-shift
#[derive(Debug, Clone, Default)]
pub struct PhaseChanges {
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

/// Create a phase and its companion achievement in one transaction.
/// An explicit position shifts the occupants up to make room.
pub async fn create(
    pool: &PgPool,
    new: &NewPhase,
    requested_position: Option<i32>,
) -> Result<Phase, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let phase_id = Uuid::new_v4();
    let achievement_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO achievements (id, title, description, icon, kind, requirement, points_reward, phase_id)
        VALUES ($1, $2, $3, $4, $5, 1, 0, $6)
        "#,
    )
    .bind(achievement_id)
    .bind(new.badge_title.clone().unwrap_or_else(|| new.title.clone()))
    .bind(
        new.badge_description
            .clone()
            .unwrap_or_else(|| format!("Awarded for completing {}", new.title)),
    )
    .bind(new.badge_url.as_deref())
    .bind(AchievementKind::Phase)
    .bind(phase_id)
    .execute(&mut *tx)
    .await?;

    let max = ordering::max_position(&mut tx, Scope::Phases).await?;
    let (position, shift) = ordering::insert_position(max, requested_position);
    if let Some(shift) = shift {
        ordering::apply_shift(&mut tx, Scope::Phases, shift, phase_id).await?;
    }

    let phase = sqlx::query_as::<_, Phase>(
        r#"
        INSERT INTO phases (id, position, title, description, intro_video_url,
                            required_level, experience_reward, points_reward,
                            badge_url, badge_title, badge_description, achievement_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(phase_id)
    .bind(position)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.intro_video_url)
    .bind(new.required_level)
    .bind(new.experience_reward)
    .bind(new.points_reward)
    .bind(new.badge_url.as_deref())
    .bind(new.badge_title.as_deref())
    .bind(new.badge_description.as_deref())
    .bind(achievement_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(phase)
}

/// All active phases in order
pub async fn list_active(pool: &PgPool) -> Result<Vec<Phase>, sqlx::Error> {
    sqlx::query_as::<_, Phase>("SELECT * FROM phases WHERE is_active ORDER BY position")
        .fetch_all(pool)
        .await
}

/// Get an active phase by id
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Phase>, sqlx::Error> {
    sqlx::query_as::<_, Phase>("SELECT * FROM phases WHERE id = $1 AND is_active")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Update phase fields and/or move it to a new position. Returns `None`
/// when the phase does not exist or is inactive.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &PhaseChanges,
) -> Result<Option<Phase>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, Phase>(
        "SELECT * FROM phases WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    let mut position = current.position;
    if let Some(requested) = changes.position {
        let max = ordering::max_position(&mut tx, Scope::Phases).await?;
        let target = ordering::clamp_move_target(max, requested);
        if let Some(shift) = ordering::move_shift(current.position, target) {
            ordering::apply_shift(&mut tx, Scope::Phases, shift, id).await?;
        }
        position = target;
    }

    let phase = sqlx::query_as::<_, Phase>(
        r#"
        UPDATE phases
        SET position = $2,
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            intro_video_url = COALESCE($5, intro_video_url),
            required_level = COALESCE($6, required_level),
            experience_reward = COALESCE($7, experience_reward),
            points_reward = COALESCE($8, points_reward),
            badge_url = COALESCE($9, badge_url),
            badge_title = COALESCE($10, badge_title),
            badge_description = COALESCE($11, badge_description),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(position)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.intro_video_url.as_deref())
    .bind(changes.required_level)
    .bind(changes.experience_reward)
    .bind(changes.points_reward)
    .bind(changes.badge_url.as_deref())
    .bind(changes.badge_title.as_deref())
    .bind(changes.badge_description.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(phase))
}

/// Soft-delete a phase: deactivate it, compact the positions above it and
/// deactivate its companion achievement. Returns `false` when the phase was
/// not active.
pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, Phase>(
        "SELECT * FROM phases WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(false);
    };

    sqlx::query("UPDATE phases SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    ordering::apply_shift(
        &mut tx,
        Scope::Phases,
        ordering::removal_shift(current.position),
        id,
    )
    .await?;

    if let Some(achievement_id) = current.achievement_id {
        sqlx::query("UPDATE achievements SET is_active = FALSE WHERE id = $1")
            .bind(achievement_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Active mission and game counts for a phase
pub async fn content_counts(pool: &PgPool, phase_id: Uuid) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM missions WHERE phase_id = $1 AND is_active),
            (SELECT COUNT(*) FROM games WHERE phase_id = $1 AND is_active)
        "#,
    )
    .bind(phase_id)
    .fetch_one(pool)
    .await
}
