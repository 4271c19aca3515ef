//! Push notification device token queries

use sqlx::PgPool;
use uuid::Uuid;

/// Register a device token for a user. Re-registration is a no-op.
pub async fn register(pool: &PgPool, user_id: Uuid, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO device_tokens (user_id, token)
        VALUES ($1, $2)
        ON CONFLICT (user_id, token) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(token)
    .execute(pool)
    .await?;
    Ok(())
}

/// Tokens registered by a user
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT token FROM device_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Drop a token everywhere it is registered. Used both for explicit
/// unregistration and when the push provider reports it invalid.
pub async fn remove_token(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM device_tokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}
