//! Ranking routes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use common::models::RankingEntry;
use serde::Deserialize;

use crate::error::{ApiResult, DbResultExt};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RankingQuery {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// Top players by total points, level breaking ties
pub async fn top(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<Vec<RankingEntry>>> {
    let limit = query.limit.clamp(1, 100);
    let entries = db::leaderboard::top(&state.pool, limit).await.db_err()?;
    Ok(Json(entries))
}

/// The caller's own rank
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<serde_json::Value>> {
    let rank = db::leaderboard::user_rank(&state.pool, user.id)
        .await
        .db_err()?;
    Ok(Json(serde_json::json!({ "rank": rank })))
}
