//! User queries

use common::models::{ProgressStats, User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Create a user. Email collisions surface as a database error.
pub async fn create(
    pool: &PgPool,
    email: &str,
    name: &str,
    role: UserRole,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, role)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await
}

/// Get user by ID
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Grant experience and recompute the level in the same statement:
/// `level = floor(total_experience / 1000) + 1`.
pub async fn add_experience(pool: &PgPool, user_id: Uuid, xp: i64) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET total_experience = total_experience + $2,
            level = ((total_experience + $2) / 1000 + 1)::int,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(xp)
    .fetch_one(pool)
    .await
}

/// Grant points (ranking currency; does not affect level)
pub async fn add_points(pool: &PgPool, user_id: Uuid, points: i64) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET total_points = total_points + $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(points)
    .fetch_one(pool)
    .await
}

/// Set the badge shown next to the user's name
pub async fn set_active_badge(
    pool: &PgPool,
    user_id: Uuid,
    badge: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET active_badge = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(badge)
    .fetch_optional(pool)
    .await
}

/// Earned badge titles (from completed phases), used to validate the
/// active-badge choice
pub async fn earned_badges(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT badge_title FROM completed_phases
        WHERE user_id = $1 AND badge_title IS NOT NULL
        ORDER BY completed_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Snapshot of the stats the achievement evaluator runs against
pub async fn progress_stats(pool: &PgPool, user_id: Uuid) -> Result<ProgressStats, sqlx::Error> {
    let row = sqlx::query_as::<_, (i32, i64, i64, i64, i64)>(
        r#"
        SELECT
            u.level,
            u.total_points,
            (SELECT COUNT(*) FROM completed_games cg WHERE cg.user_id = u.id),
            (SELECT COUNT(*) FROM completed_missions cm WHERE cm.user_id = u.id),
            (SELECT COUNT(*) FROM completed_phases cp WHERE cp.user_id = u.id)
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let completed_phase_ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT phase_id FROM completed_phases WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ProgressStats {
        level: row.0,
        total_points: row.1,
        games_completed: row.2,
        missions_completed: row.3,
        phases_completed: row.4,
        completed_phase_ids,
    })
}
