//! Progression engine: video gating, game scoring and completion cascades
//!
//! Per (user, phase) the states run NOT_STARTED → VIDEO_WATCHED →
//! IN_PROGRESS → PHASE_COMPLETED. Every completion event cascades: grant
//! XP/points, recompute the level, check mission and phase completion,
//! award the phase badge, then run the achievement evaluator. Each grant
//! sits behind an "already completed" ledger guard so re-invocation never
//! double-pays.

use common::models::{
    Achievement, Game, GameAttempt, Mission, MissionKind, Phase, User, UserProgress,
};
use common::Error;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::achievements::AchievementChecker;

/// Minimum passing score: 70% of the game's points, rounded up
pub fn pass_threshold(points: i32) -> i32 {
    (points * 7 + 9) / 10
}

/// Derived level for a total experience amount
pub fn level_for_experience(total_experience: i64) -> i32 {
    (total_experience / 1000 + 1) as i32
}

/// Unlock flags for an ordered sequence: the item at index `i` is unlocked
/// iff the intro video was watched and either it is first or its
/// predecessor is completed. Recomputed on every fetch, never stored.
pub fn unlock_flags(video_watched: bool, completed: &[bool]) -> Vec<bool> {
    (0..completed.len())
        .map(|i| video_watched && (i == 0 || completed[i - 1]))
        .collect()
}

/// Who is asking for a mission completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    /// The player, through the mission-complete endpoint: already-completed
    /// and out-of-order requests are rejected.
    Player,
    /// An approved review: already-completed is a no-op and ordering is the
    /// reviewer's call.
    Review,
}

/// Result of a mission completion cascade
#[derive(Debug)]
pub struct CompletionOutcome {
    /// The mission was newly appended to the ledger by this call
    pub mission_completed: bool,
    /// The phase was newly completed by this call
    pub phase_completed: bool,
    pub user: User,
    pub new_achievements: Vec<Achievement>,
}

/// Result of a game score submission
#[derive(Debug)]
pub enum ScoreOutcome {
    /// Below the pass threshold: the attempt is recorded, nothing granted
    Failed { attempt: GameAttempt, threshold: i32 },
    /// At or above the threshold: ledger updated and the cascade ran
    Passed {
        attempt: GameAttempt,
        user: User,
        mission_completed: bool,
        phase_completed: bool,
        new_achievements: Vec<Achievement>,
    },
}

/// A phase with its per-user annotations
#[derive(Debug, Serialize)]
pub struct PhaseStatus {
    #[serde(flatten)]
    pub phase: Phase,
    pub is_unlocked: bool,
    pub is_completed: bool,
    pub missions_count: i64,
    pub games_count: i64,
}

/// A mission with its per-user unlock/completion flags
#[derive(Debug, Serialize)]
pub struct MissionStatus {
    #[serde(flatten)]
    pub mission: Mission,
    pub is_unlocked: bool,
    pub is_completed: bool,
}

/// A game with its per-user unlock/completion flags
#[derive(Debug, Serialize)]
pub struct GameStatus {
    #[serde(flatten)]
    pub game: Game,
    pub is_unlocked: bool,
    pub is_completed: bool,
}

/// Runs the progression state machine against the store
pub struct ProgressionEngine {
    pool: PgPool,
    achievements: AchievementChecker,
}

impl ProgressionEngine {
    pub fn new(pool: PgPool) -> Self {
        Self {
            achievements: AchievementChecker::new(pool.clone()),
            pool,
        }
    }

    /// NOT_STARTED → VIDEO_WATCHED. Creates the ledger if absent; repeat
    /// calls are no-ops.
    pub async fn mark_video_watched(
        &self,
        user_id: Uuid,
        phase_id: Uuid,
    ) -> Result<UserProgress, Error> {
        db::phases::get(&self.pool, phase_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("Phase".into()))?;

        db::progress::mark_video_watched(&self.pool, user_id, phase_id)
            .await
            .map_err(Error::db)
    }

    /// Progress ledger for (user, phase), if any
    pub async fn progress(
        &self,
        user_id: Uuid,
        phase_id: Uuid,
    ) -> Result<Option<UserProgress>, Error> {
        db::progress::get(&self.pool, user_id, phase_id)
            .await
            .map_err(Error::db)
    }

    /// Submit a score for a game. Guards: the phase video must be watched,
    /// the game must not be completed yet, the previous game in the
    /// mission must be, and the attempt limit must not be exhausted.
    pub async fn submit_game_score(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        score: i32,
    ) -> Result<ScoreOutcome, Error> {
        if score < 0 {
            return Err(Error::Validation("Score must be non-negative".into()));
        }

        let game = db::games::get(&self.pool, game_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("Game".into()))?;

        let progress = db::progress::get(&self.pool, user_id, game.phase_id)
            .await
            .map_err(Error::db)?;
        if !progress.map(|p| p.video_watched).unwrap_or(false) {
            return Err(Error::Conflict(
                "Watch the phase intro video before playing".into(),
            ));
        }

        let completed = db::progress::completed_game_ids(&self.pool, user_id, game.mission_id)
            .await
            .map_err(Error::db)?;
        if completed.contains(&game.id) {
            return Err(Error::Conflict("Game already completed".into()));
        }

        if game.position > 1 {
            let siblings = db::games::list_active_by_mission(&self.pool, game.mission_id)
                .await
                .map_err(Error::db)?;
            if let Some(previous) = siblings.iter().find(|g| g.position == game.position - 1) {
                if !completed.contains(&previous.id) {
                    return Err(Error::Conflict("Complete the previous game first".into()));
                }
            }
        }

        if game.max_attempts > 0 {
            let attempt = db::progress::get_attempt(&self.pool, user_id, game.id)
                .await
                .map_err(Error::db)?;
            if attempt.map(|a| a.attempts).unwrap_or(0) >= game.max_attempts {
                return Err(Error::Conflict(format!(
                    "Attempt limit of {} reached",
                    game.max_attempts
                )));
            }
        }

        let threshold = pass_threshold(game.points);
        let attempt = db::progress::record_attempt(&self.pool, user_id, game.id, score)
            .await
            .map_err(Error::db)?;

        if score < threshold {
            info!(
                "Attempt {} on game {} below threshold ({} < {})",
                attempt.attempts, game.title, score, threshold
            );
            return Ok(ScoreOutcome::Failed { attempt, threshold });
        }

        db::progress::mark_attempt_completed(&self.pool, user_id, game.id)
            .await
            .map_err(Error::db)?;
        let appended = db::progress::record_game_completion(
            &self.pool,
            user_id,
            game.id,
            game.mission_id,
            game.phase_id,
            score,
        )
        .await
        .map_err(Error::db)?;
        if appended {
            db::users::add_experience(&self.pool, user_id, game.points as i64)
                .await
                .map_err(Error::db)?;
            info!(
                "Game {} completed by {} (+{} XP)",
                game.title, user_id, game.points
            );
        }

        let mut mission_completed = false;
        let mut phase_completed = false;
        let total = db::games::count_active(&self.pool, game.mission_id)
            .await
            .map_err(Error::db)?;
        let done = db::progress::completed_game_ids(&self.pool, user_id, game.mission_id)
            .await
            .map_err(Error::db)?
            .len() as i64;
        if done >= total {
            if let Some(mission) = db::missions::get(&self.pool, game.mission_id)
                .await
                .map_err(Error::db)?
            {
                let (m, p) = self.finish_mission(user_id, &mission, None).await?;
                mission_completed = m;
                phase_completed = p;
            }
        }

        let new_achievements = self.achievements.check(user_id).await?;
        let user = self.load_user(user_id).await?;
        let attempt = db::progress::get_attempt(&self.pool, user_id, game.id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::Internal("attempt row vanished".into()))?;

        Ok(ScoreOutcome::Passed {
            attempt,
            user,
            mission_completed,
            phase_completed,
            new_achievements,
        })
    }

    /// Complete a mission outside the game path: directly by the player
    /// (video and games kinds) or through an approved task review.
    pub async fn complete_mission(
        &self,
        user_id: Uuid,
        mission_id: Uuid,
        source: CompletionSource,
    ) -> Result<CompletionOutcome, Error> {
        let mission = db::missions::get(&self.pool, mission_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("Mission".into()))?;

        match source {
            CompletionSource::Player => {
                let progress = db::progress::get(&self.pool, user_id, mission.phase_id)
                    .await
                    .map_err(Error::db)?;
                if !progress.map(|p| p.video_watched).unwrap_or(false) {
                    return Err(Error::Conflict("Watch the phase intro video first".into()));
                }

                let completed =
                    db::progress::completed_mission_ids(&self.pool, user_id, mission.phase_id)
                        .await
                        .map_err(Error::db)?;
                if completed.contains(&mission.id) {
                    return Err(Error::Conflict("Mission already completed".into()));
                }

                if mission.position > 1 {
                    let siblings =
                        db::missions::list_active_by_phase(&self.pool, mission.phase_id)
                            .await
                            .map_err(Error::db)?;
                    if let Some(previous) =
                        siblings.iter().find(|m| m.position == mission.position - 1)
                    {
                        if !completed.contains(&previous.id) {
                            return Err(Error::Conflict(
                                "Complete the previous mission first".into(),
                            ));
                        }
                    }
                }

                match mission.kind {
                    MissionKind::Video => {}
                    MissionKind::Games => {
                        let total = db::games::count_active(&self.pool, mission.id)
                            .await
                            .map_err(Error::db)?;
                        let done =
                            db::progress::completed_game_ids(&self.pool, user_id, mission.id)
                                .await
                                .map_err(Error::db)?
                                .len() as i64;
                        if done < total {
                            return Err(Error::Conflict(
                                "Complete all games in this mission first".into(),
                            ));
                        }
                    }
                    _ => {
                        return Err(Error::Validation(
                            "This mission is completed through a task submission".into(),
                        ))
                    }
                }
            }
            CompletionSource::Review => {
                // First approved submission may arrive before any video
                // watch; the ledger is created here in that case.
                db::progress::ensure(&self.pool, user_id, mission.phase_id)
                    .await
                    .map_err(Error::db)?;
            }
        }

        let (mission_completed, phase_completed) =
            self.finish_mission(user_id, &mission, None).await?;
        let new_achievements = self.achievements.check(user_id).await?;
        let user = self.load_user(user_id).await?;

        Ok(CompletionOutcome {
            mission_completed,
            phase_completed,
            user,
            new_achievements,
        })
    }

    /// Append the mission to the ledger, grant its rewards once, then run
    /// the phase-completion check. Returns (mission newly completed, phase
    /// newly completed).
    async fn finish_mission(
        &self,
        user_id: Uuid,
        mission: &Mission,
        score: Option<i32>,
    ) -> Result<(bool, bool), Error> {
        let appended = db::progress::record_mission_completion(
            &self.pool,
            user_id,
            mission.id,
            mission.phase_id,
            score,
        )
        .await
        .map_err(Error::db)?;

        if appended {
            if mission.experience_reward > 0 {
                db::users::add_experience(&self.pool, user_id, mission.experience_reward as i64)
                    .await
                    .map_err(Error::db)?;
            }
            if mission.points_reward > 0 {
                db::users::add_points(&self.pool, user_id, mission.points_reward as i64)
                    .await
                    .map_err(Error::db)?;
            }
            info!("Mission {} completed by {}", mission.title, user_id);
        }

        let phase_completed = self.check_phase_completion(user_id, mission.phase_id).await?;
        Ok((appended, phase_completed))
    }

    /// When every active mission of the phase is completed, flip the
    /// ledger flag, award the badge and grant the phase rewards — all
    /// exactly once.
    async fn check_phase_completion(&self, user_id: Uuid, phase_id: Uuid) -> Result<bool, Error> {
        let total = db::missions::count_active(&self.pool, phase_id)
            .await
            .map_err(Error::db)?;
        if total == 0 {
            return Ok(false);
        }

        let done = db::progress::count_completed_missions(&self.pool, user_id, phase_id)
            .await
            .map_err(Error::db)?;
        if done < total {
            return Ok(false);
        }

        let newly = db::progress::mark_phase_completed(&self.pool, user_id, phase_id)
            .await
            .map_err(Error::db)?;
        if !newly {
            return Ok(false);
        }

        if let Some(phase) = db::phases::get(&self.pool, phase_id)
            .await
            .map_err(Error::db)?
        {
            let appended = db::progress::record_phase_completion(
                &self.pool,
                user_id,
                phase.id,
                phase.badge_url.as_deref(),
                phase.badge_title.as_deref(),
            )
            .await
            .map_err(Error::db)?;

            if appended {
                if phase.experience_reward > 0 {
                    db::users::add_experience(&self.pool, user_id, phase.experience_reward as i64)
                        .await
                        .map_err(Error::db)?;
                }
                if phase.points_reward > 0 {
                    db::users::add_points(&self.pool, user_id, phase.points_reward as i64)
                        .await
                        .map_err(Error::db)?;
                }
                info!("🎉 Phase {} completed by {}", phase.title, user_id);
            }
        }

        Ok(true)
    }

    /// All active phases annotated for one user: a phase is unlocked when
    /// it is first (or its predecessor is completed) and the user meets
    /// its required level.
    pub async fn phase_statuses(&self, user: &User) -> Result<Vec<PhaseStatus>, Error> {
        let phases = db::phases::list_active(&self.pool).await.map_err(Error::db)?;

        let mut statuses = Vec::with_capacity(phases.len());
        let mut previous_completed = true;
        for phase in phases {
            let progress = db::progress::get(&self.pool, user.id, phase.id)
                .await
                .map_err(Error::db)?;
            let is_completed = progress.map(|p| p.phase_completed).unwrap_or(false);
            let is_unlocked = previous_completed && user.level >= phase.required_level;
            let (missions_count, games_count) = db::phases::content_counts(&self.pool, phase.id)
                .await
                .map_err(Error::db)?;

            previous_completed = is_completed;
            statuses.push(PhaseStatus {
                phase,
                is_unlocked,
                is_completed,
                missions_count,
                games_count,
            });
        }

        Ok(statuses)
    }

    /// Active missions of a phase with per-user unlock/completion flags
    pub async fn mission_statuses(
        &self,
        user_id: Uuid,
        phase_id: Uuid,
    ) -> Result<Vec<MissionStatus>, Error> {
        let missions = db::missions::list_active_by_phase(&self.pool, phase_id)
            .await
            .map_err(Error::db)?;
        let progress = db::progress::get(&self.pool, user_id, phase_id)
            .await
            .map_err(Error::db)?;
        let watched = progress.map(|p| p.video_watched).unwrap_or(false);
        let completed_ids = db::progress::completed_mission_ids(&self.pool, user_id, phase_id)
            .await
            .map_err(Error::db)?;

        let completed: Vec<bool> = missions
            .iter()
            .map(|m| completed_ids.contains(&m.id))
            .collect();
        let unlocked = unlock_flags(watched, &completed);

        Ok(missions
            .into_iter()
            .zip(completed.iter().zip(unlocked.iter()))
            .map(|(mission, (&is_completed, &is_unlocked))| MissionStatus {
                mission,
                is_unlocked,
                is_completed,
            })
            .collect())
    }

    /// Active games of a mission with per-user unlock/completion flags
    pub async fn game_statuses(
        &self,
        user_id: Uuid,
        mission_id: Uuid,
    ) -> Result<Vec<GameStatus>, Error> {
        let mission = db::missions::get(&self.pool, mission_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("Mission".into()))?;
        let games = db::games::list_active_by_mission(&self.pool, mission_id)
            .await
            .map_err(Error::db)?;
        let progress = db::progress::get(&self.pool, user_id, mission.phase_id)
            .await
            .map_err(Error::db)?;
        let watched = progress.map(|p| p.video_watched).unwrap_or(false);
        let completed_ids = db::progress::completed_game_ids(&self.pool, user_id, mission_id)
            .await
            .map_err(Error::db)?;

        let completed: Vec<bool> = games.iter().map(|g| completed_ids.contains(&g.id)).collect();
        let unlocked = unlock_flags(watched, &completed);

        Ok(games
            .into_iter()
            .zip(completed.iter().zip(unlocked.iter()))
            .map(|(game, (&is_completed, &is_unlocked))| GameStatus {
                game,
                is_unlocked,
                is_completed,
            })
            .collect())
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, Error> {
        db::users::get_by_id(&self.pool, user_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("User".into()))
    }
}
