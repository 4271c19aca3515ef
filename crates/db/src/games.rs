//! Game queries

use common::models::Game;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ordering::{self, Scope};

/// Fields for creating a game
#[derive(Debug, Clone)]
pub struct NewGame {
    pub title: String,
    pub points: i32,
    pub max_attempts: i32,
}

/// Optional field updates; `position` requests a move within the mission
#[derive(Debug, Clone, Default)]
pub struct GameChanges {
    pub title: Option<String>,
    pub points: Option<i32>,
    pub max_attempts: Option<i32>,
    pub position: Option<i32>,
}

/// Create a game within a mission, shifting occupants if an explicit
/// position is given.
pub async fn create(
    pool: &PgPool,
    mission_id: Uuid,
    phase_id: Uuid,
    new: &NewGame,
    requested_position: Option<i32>,
) -> Result<Game, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id = Uuid::new_v4();
    let max = ordering::max_position(&mut tx, Scope::Games { mission_id }).await?;
    let (position, shift) = ordering::insert_position(max, requested_position);
    if let Some(shift) = shift {
        ordering::apply_shift(&mut tx, Scope::Games { mission_id }, shift, id).await?;
    }

    let game = sqlx::query_as::<_, Game>(
        r#"
        INSERT INTO games (id, mission_id, phase_id, position, title, points, max_attempts)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(mission_id)
    .bind(phase_id)
    .bind(position)
    .bind(&new.title)
    .bind(new.points)
    .bind(new.max_attempts)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(game)
}

/// Active games of a mission in order
pub async fn list_active_by_mission(
    pool: &PgPool,
    mission_id: Uuid,
) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>(
        "SELECT * FROM games WHERE mission_id = $1 AND is_active ORDER BY position",
    )
    .bind(mission_id)
    .fetch_all(pool)
    .await
}

/// Get an active game by id
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1 AND is_active")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Count active games in a mission
pub async fn count_active(pool: &PgPool, mission_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM games WHERE mission_id = $1 AND is_active")
        .bind(mission_id)
        .fetch_one(pool)
        .await
}

/// Update game fields and/or move it within its mission
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &GameChanges,
) -> Result<Option<Game>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, Game>(
        "SELECT * FROM games WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    let scope = Scope::Games { mission_id: current.mission_id };
    let mut position = current.position;
    if let Some(requested) = changes.position {
        let max = ordering::max_position(&mut tx, scope).await?;
        let target = ordering::clamp_move_target(max, requested);
        if let Some(shift) = ordering::move_shift(current.position, target) {
            ordering::apply_shift(&mut tx, scope, shift, id).await?;
        }
        position = target;
    }

    let game = sqlx::query_as::<_, Game>(
        r#"
        UPDATE games
        SET position = $2,
            title = COALESCE($3, title),
            points = COALESCE($4, points),
            max_attempts = COALESCE($5, max_attempts),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(position)
    .bind(changes.title.as_deref())
    .bind(changes.points)
    .bind(changes.max_attempts)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(game))
}

/// Soft-delete a game and compact its mission's positions. Returns `false`
/// when the game was not active.
pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, Game>(
        "SELECT * FROM games WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(false);
    };

    sqlx::query("UPDATE games SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    ordering::apply_shift(
        &mut tx,
        Scope::Games { mission_id: current.mission_id },
        ordering::removal_shift(current.position),
        id,
    )
    .await?;

    tx.commit().await?;
    Ok(true)
}
