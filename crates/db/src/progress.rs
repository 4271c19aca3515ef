//! Per-user progress ledgers: user_progress rows, completion records and
//! game attempts. Appends are conflict-ignoring so the cascade can re-run
//! without duplicating grants.

use common::models::{GameAttempt, UserProgress};
use sqlx::PgPool;
use uuid::Uuid;

/// Get the progress ledger for (user, phase)
pub async fn get(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
) -> Result<Option<UserProgress>, sqlx::Error> {
    sqlx::query_as::<_, UserProgress>(
        "SELECT * FROM user_progress WHERE user_id = $1 AND phase_id = $2",
    )
    .bind(user_id)
    .bind(phase_id)
    .fetch_optional(pool)
    .await
}

/// Create the ledger if absent and mark the intro video watched. Repeat
/// calls are no-ops.
pub async fn mark_video_watched(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
) -> Result<UserProgress, sqlx::Error> {
    sqlx::query_as::<_, UserProgress>(
        r#"
        INSERT INTO user_progress (id, user_id, phase_id, video_watched)
        VALUES ($1, $2, $3, TRUE)
        ON CONFLICT (user_id, phase_id) DO UPDATE
        SET video_watched = TRUE, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(phase_id)
    .fetch_one(pool)
    .await
}

/// Lazily create the ledger without touching the video flag
pub async fn ensure(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
) -> Result<UserProgress, sqlx::Error> {
    sqlx::query_as::<_, UserProgress>(
        r#"
        INSERT INTO user_progress (id, user_id, phase_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, phase_id) DO UPDATE SET updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(phase_id)
    .fetch_one(pool)
    .await
}

/// Mission ids the user has completed in a phase
pub async fn completed_mission_ids(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT mission_id FROM completed_missions WHERE user_id = $1 AND phase_id = $2",
    )
    .bind(user_id)
    .bind(phase_id)
    .fetch_all(pool)
    .await
}

/// Game ids the user has completed in a mission
pub async fn completed_game_ids(
    pool: &PgPool,
    user_id: Uuid,
    mission_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT game_id FROM completed_games WHERE user_id = $1 AND mission_id = $2",
    )
    .bind(user_id)
    .bind(mission_id)
    .fetch_all(pool)
    .await
}

/// Append a game to the completion ledger. Returns `false` when it was
/// already there (no grant should follow).
pub async fn record_game_completion(
    pool: &PgPool,
    user_id: Uuid,
    game_id: Uuid,
    mission_id: Uuid,
    phase_id: Uuid,
    score: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO completed_games (user_id, game_id, mission_id, phase_id, score)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, game_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(game_id)
    .bind(mission_id)
    .bind(phase_id)
    .bind(score)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Append a mission to the completion ledger. Returns `false` when it was
/// already there.
pub async fn record_mission_completion(
    pool: &PgPool,
    user_id: Uuid,
    mission_id: Uuid,
    phase_id: Uuid,
    score: Option<i32>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO completed_missions (user_id, mission_id, phase_id, score)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, mission_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(mission_id)
    .bind(phase_id)
    .bind(score)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Distinct completed missions within a phase
pub async fn count_completed_missions(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM completed_missions WHERE user_id = $1 AND phase_id = $2",
    )
    .bind(user_id)
    .bind(phase_id)
    .fetch_one(pool)
    .await
}

/// Flip the ledger's phase_completed flag. Returns `false` when it was
/// already set, so the phase grant runs once.
pub async fn mark_phase_completed(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE user_progress
        SET phase_completed = TRUE, completed_at = NOW(), updated_at = NOW()
        WHERE user_id = $1 AND phase_id = $2 AND NOT phase_completed
        "#,
    )
    .bind(user_id)
    .bind(phase_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Append the phase (with its badge snapshot) to the user's completed
/// phases. Returns `false` when already present.
pub async fn record_phase_completion(
    pool: &PgPool,
    user_id: Uuid,
    phase_id: Uuid,
    badge_url: Option<&str>,
    badge_title: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO completed_phases (user_id, phase_id, badge_url, badge_title)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, phase_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(phase_id)
    .bind(badge_url)
    .bind(badge_title)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Record one attempt at a game, keeping the best score
pub async fn record_attempt(
    pool: &PgPool,
    user_id: Uuid,
    game_id: Uuid,
    score: i32,
) -> Result<GameAttempt, sqlx::Error> {
    sqlx::query_as::<_, GameAttempt>(
        r#"
        INSERT INTO game_attempts (user_id, game_id, score, best_score, attempts)
        VALUES ($1, $2, $3, $3, 1)
        ON CONFLICT (user_id, game_id) DO UPDATE
        SET score = $3,
            best_score = GREATEST(game_attempts.best_score, $3),
            attempts = game_attempts.attempts + 1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(game_id)
    .bind(score)
    .fetch_one(pool)
    .await
}

/// Attempt state for (user, game)
pub async fn get_attempt(
    pool: &PgPool,
    user_id: Uuid,
    game_id: Uuid,
) -> Result<Option<GameAttempt>, sqlx::Error> {
    sqlx::query_as::<_, GameAttempt>(
        "SELECT * FROM game_attempts WHERE user_id = $1 AND game_id = $2",
    )
    .bind(user_id)
    .bind(game_id)
    .fetch_optional(pool)
    .await
}

/// Mark the attempt row completed
pub async fn mark_attempt_completed(
    pool: &PgPool,
    user_id: Uuid,
    game_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE game_attempts
        SET completed = TRUE, completed_at = NOW()
        WHERE user_id = $1 AND game_id = $2 AND NOT completed
        "#,
    )
    .bind(user_id)
    .bind(game_id)
    .execute(pool)
    .await?;
    Ok(())
}

