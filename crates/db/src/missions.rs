//! Mission queries

use common::models::{Mission, MissionKind, MissionTask};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ordering::{self, Scope};

/// Fields for creating a mission
#[derive(Debug, Clone)]
pub struct NewMission {
    pub kind: MissionKind,
    pub title: String,
    pub description: String,
    pub experience_reward: i32,
    pub points_reward: i32,
    pub task: MissionTask,
}

/// Optional field updates; `position` moves within the phase, `phase_id`
/// moves the mission (and its games) to another phase
#[derive(Debug, Clone, Default)]
pub struct MissionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub experience_reward: Option<i32>,
    pub points_reward: Option<i32>,
    /// Replacing the task also replaces `kind`; callers derive it from the
    /// new task variant
    pub kind: Option<MissionKind>,
    pub task: Option<MissionTask>,
    pub position: Option<i32>,
    pub phase_id: Option<Uuid>,
}

/// Create a mission within a phase, shifting occupants if an explicit
/// position is given.
pub async fn create(
    pool: &PgPool,
    phase_id: Uuid,
    new: &NewMission,
    requested_position: Option<i32>,
) -> Result<Mission, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id = Uuid::new_v4();
    let max = ordering::max_position(&mut tx, Scope::Missions { phase_id }).await?;
    let (position, shift) = ordering::insert_position(max, requested_position);
    if let Some(shift) = shift {
        ordering::apply_shift(&mut tx, Scope::Missions { phase_id }, shift, id).await?;
    }

    let mission = sqlx::query_as::<_, Mission>(
        r#"
        INSERT INTO missions (id, phase_id, position, kind, title, description,
                              experience_reward, points_reward, task)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(phase_id)
    .bind(position)
    .bind(new.kind)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.experience_reward)
    .bind(new.points_reward)
    .bind(Json(&new.task))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(mission)
}

/// Active missions of a phase in order
pub async fn list_active_by_phase(
    pool: &PgPool,
    phase_id: Uuid,
) -> Result<Vec<Mission>, sqlx::Error> {
    sqlx::query_as::<_, Mission>(
        "SELECT * FROM missions WHERE phase_id = $1 AND is_active ORDER BY position",
    )
    .bind(phase_id)
    .fetch_all(pool)
    .await
}

/// Get an active mission by id
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Mission>, sqlx::Error> {
    sqlx::query_as::<_, Mission>("SELECT * FROM missions WHERE id = $1 AND is_active")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Count active missions in a phase
pub async fn count_active(pool: &PgPool, phase_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM missions WHERE phase_id = $1 AND is_active",
    )
    .bind(phase_id)
    .fetch_one(pool)
    .await
}

/// Update mission fields and/or move it, within its phase or to another
/// one. A cross-phase move compacts the source scope, inserts into the
/// destination scope and drags the mission's games along.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &MissionChanges,
) -> Result<Option<Mission>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, Mission>(
        "SELECT * FROM missions WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    let source = Scope::Missions { phase_id: current.phase_id };
    let mut phase_id = current.phase_id;
    let mut position = current.position;

    match changes.phase_id {
        Some(destination) if destination != current.phase_id => {
            ordering::apply_shift(&mut tx, source, ordering::removal_shift(current.position), id)
                .await?;

            let dest_scope = Scope::Missions { phase_id: destination };
            let max = ordering::max_position(&mut tx, dest_scope).await?;
            let (target, shift) = ordering::insert_position(max, changes.position);
            if let Some(shift) = shift {
                ordering::apply_shift(&mut tx, dest_scope, shift, id).await?;
            }
            phase_id = destination;
            position = target;

            sqlx::query("UPDATE games SET phase_id = $2, updated_at = NOW() WHERE mission_id = $1")
                .bind(id)
                .bind(destination)
                .execute(&mut *tx)
                .await?;
        }
        _ => {
            if let Some(requested) = changes.position {
                let max = ordering::max_position(&mut tx, source).await?;
                let target = ordering::clamp_move_target(max, requested);
                if let Some(shift) = ordering::move_shift(current.position, target) {
                    ordering::apply_shift(&mut tx, source, shift, id).await?;
                }
                position = target;
            }
        }
    }

    let mission = sqlx::query_as::<_, Mission>(
        r#"
        UPDATE missions
        SET phase_id = $2,
            position = $3,
            title = COALESCE($4, title),
            description = COALESCE($5, description),
            experience_reward = COALESCE($6, experience_reward),
            points_reward = COALESCE($7, points_reward),
            kind = COALESCE($8, kind),
            task = COALESCE($9, task),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(phase_id)
    .bind(position)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.experience_reward)
    .bind(changes.points_reward)
    .bind(changes.kind)
    .bind(changes.task.as_ref().map(Json))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(mission))
}

/// Soft-delete a mission and compact its phase's positions. Returns `false`
/// when the mission was not active.
pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, Mission>(
        "SELECT * FROM missions WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(false);
    };

    sqlx::query("UPDATE missions SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    ordering::apply_shift(
        &mut tx,
        Scope::Missions { phase_id: current.phase_id },
        ordering::removal_shift(current.position),
        id,
    )
    .await?;

    tx.commit().await?;
    Ok(true)
}
