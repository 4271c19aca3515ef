//! Achievement checking and unlocking

use common::models::{Achievement, AchievementKind, ProgressStats};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Definitions from `defs` whose threshold the stats meet. Pure; callers
/// pass only definitions the user does not own yet.
pub fn qualifying<'a>(stats: &ProgressStats, defs: &'a [Achievement]) -> Vec<&'a Achievement> {
    defs.iter().filter(|a| requirement_met(stats, a)).collect()
}

fn requirement_met(stats: &ProgressStats, achievement: &Achievement) -> bool {
    let threshold = achievement.requirement as i64;
    match achievement.kind {
        AchievementKind::Level => stats.level as i64 >= threshold,
        AchievementKind::Points => stats.total_points >= threshold,
        AchievementKind::Games => stats.games_completed >= threshold,
        AchievementKind::Mission => stats.missions_completed >= threshold,
        // A phase-tied achievement unlocks with its phase; an untied one
        // counts completed phases.
        AchievementKind::Phase => match achievement.phase_id {
            Some(phase_id) => stats.completed_phase_ids.contains(&phase_id),
            None => stats.phases_completed >= threshold,
        },
        // Granted manually, never by the evaluator
        AchievementKind::Special => false,
    }
}

/// Checks and awards achievements after progression events
pub struct AchievementChecker {
    pool: PgPool,
}

impl AchievementChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Evaluate all definitions the user doesn't own yet and unlock the
    /// ones now satisfied. Safe to call redundantly: the unlock insert is
    /// conflict-ignoring and the points grant only follows a real insert.
    pub async fn check(&self, user_id: Uuid) -> Result<Vec<Achievement>, common::Error> {
        let stats = db::users::progress_stats(&self.pool, user_id)
            .await
            .map_err(common::Error::db)?;
        let candidates = db::achievements::list_active_not_owned(&self.pool, user_id)
            .await
            .map_err(common::Error::db)?;

        let mut unlocked = Vec::new();
        for achievement in qualifying(&stats, &candidates) {
            let newly = db::achievements::unlock(&self.pool, user_id, achievement.id)
                .await
                .map_err(common::Error::db)?;
            if !newly {
                continue;
            }

            if achievement.points_reward > 0 {
                db::users::add_points(&self.pool, user_id, achievement.points_reward as i64)
                    .await
                    .map_err(common::Error::db)?;
            }

            info!(
                "🏆 Achievement unlocked: {} for user {}",
                achievement.title, user_id
            );
            unlocked.push(achievement.clone());
        }

        Ok(unlocked)
    }
}
