//! Ranking queries

use common::models::RankingEntry;
use sqlx::PgPool;
use uuid::Uuid;

/// Top players ordered by total points, level breaking ties
pub async fn top(pool: &PgPool, limit: i64) -> Result<Vec<RankingEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Uuid, String, i32, i64, i64, Option<String>)>(
        r#"
        SELECT id, name, level, total_points, total_experience, active_badge
        FROM users
        WHERE role = 'player'
        ORDER BY total_points DESC, level DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| RankingEntry {
            rank: (idx + 1) as i32,
            user_id: row.0,
            name: row.1,
            level: row.2,
            total_points: row.3,
            total_experience: row.4,
            active_badge: row.5,
        })
        .collect();

    Ok(entries)
}

/// A player's position on the ranking
pub async fn user_rank(pool: &PgPool, user_id: Uuid) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        r#"
        WITH ranked AS (
            SELECT id,
                   ROW_NUMBER() OVER (ORDER BY total_points DESC, level DESC) AS rank
            FROM users
            WHERE role = 'player'
        )
        SELECT rank::int FROM ranked WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
