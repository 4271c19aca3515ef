//! Domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// A platform user (player or admin)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub total_experience: i64,
    pub total_points: i64,
    pub level: i32,
    pub active_badge: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Player,
    Admin,
}

/// A top-level content unit, globally ordered
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Phase {
    pub id: Uuid,
    /// 1-based position among active phases, dense
    pub position: i32,
    pub title: String,
    pub description: String,
    pub intro_video_url: String,
    pub required_level: i32,
    pub experience_reward: i32,
    pub points_reward: i32,
    pub badge_url: Option<String>,
    pub badge_title: Option<String>,
    pub badge_description: Option<String>,
    /// Companion achievement created alongside the phase
    pub achievement_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task within a phase, ordered within its phase
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mission {
    pub id: Uuid,
    pub phase_id: Uuid,
    /// 1-based position among active missions of the phase, dense
    pub position: i32,
    pub kind: MissionKind,
    pub title: String,
    pub description: String,
    pub experience_reward: i32,
    pub points_reward: i32,
    pub task: Json<MissionTask>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "mission_kind", rename_all = "lowercase")]
pub enum MissionKind {
    Video,
    Photo,
    Games,
    Form,
    Text,
}

/// Kind-specific task configuration, one variant per mission kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MissionTask {
    Video { video_url: String },
    Photo { instructions: String },
    Games,
    Form { questions: Vec<FormQuestion> },
    Text { prompt: String, min_words: i32, max_words: i32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormQuestion {
    pub id: String,
    pub label: String,
    pub required: bool,
}

/// A scored activity within a games-type mission
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Game {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub phase_id: Uuid,
    /// 1-based position among active games of the mission, dense
    pub position: i32,
    pub title: String,
    pub points: i32,
    /// 0 = unlimited
    pub max_attempts: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable per-(user, phase) progress ledger. Created lazily, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phase_id: Uuid,
    pub video_watched: bool,
    pub phase_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompletedMission {
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub phase_id: Uuid,
    pub score: Option<i32>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompletedGame {
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub mission_id: Uuid,
    pub phase_id: Uuid,
    pub score: i32,
    pub completed_at: DateTime<Utc>,
}

/// Per-(user, game) attempt tracking, distinct from the completion ledger
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameAttempt {
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub score: i32,
    pub best_score: i32,
    pub attempts: i32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A user's proof-of-task artifact awaiting or having received review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub phase_id: Uuid,
    pub kind: SubmissionKind,
    pub payload: Option<Json<SubmissionPayload>>,
    pub photo_url: Option<String>,
    pub status: SubmissionStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "submission_kind", rename_all = "lowercase")]
pub enum SubmissionKind {
    Completed,
    Unable,
    Form,
    Text,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Submitted proof content for form/text submissions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubmissionPayload {
    Form { answers: std::collections::HashMap<String, String> },
    Text { content: String },
}

/// An achievement definition. The evaluation rule is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub kind: AchievementKind,
    pub requirement: i32,
    pub points_reward: i32,
    pub phase_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "achievement_kind", rename_all = "lowercase")]
pub enum AchievementKind {
    Level,
    Points,
    Games,
    Phase,
    Mission,
    Special,
}

/// A user's unlocked achievement
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// A completed phase with its badge snapshot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompletedPhase {
    pub user_id: Uuid,
    pub phase_id: Uuid,
    pub badge_url: Option<String>,
    pub badge_title: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// A device registered for push notifications
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceToken {
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of the stats the achievement evaluator runs against
#[derive(Debug, Clone, Default)]
pub struct ProgressStats {
    pub level: i32,
    pub total_points: i64,
    pub games_completed: i64,
    pub missions_completed: i64,
    pub phases_completed: i64,
    pub completed_phase_ids: Vec<Uuid>,
}

/// Ranking entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: i32,
    pub user_id: Uuid,
    pub name: String,
    pub level: i32,
    pub total_points: i64,
    pub total_experience: i64,
    pub active_badge: Option<String>,
}
