//! Background delivery of unlock notifications
//!
//! Achievement unlocks are written with `notified_at IS NULL`; this loop
//! drains them, sends push + email best-effort and marks them notified
//! whether or not delivery worked (at-most-once — a dead provider must not
//! cause a re-spam on recovery).

use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::Notifier;

/// Configuration for the delivery loop
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Interval between delivery runs
    pub interval: Duration,
    /// Unlocks drained per run
    pub batch_size: i64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            batch_size: 20,
        }
    }
}

/// Background service draining pending unlock notifications
pub struct DeliveryService {
    pool: PgPool,
    notifier: Notifier,
    config: DeliveryConfig,
}

impl DeliveryService {
    pub fn new(pool: PgPool, notifier: Notifier, config: DeliveryConfig) -> Self {
        Self {
            pool,
            notifier,
            config,
        }
    }

    /// Start the delivery loop
    pub async fn run(self) {
        info!(
            "Starting notification delivery (interval: {:?})",
            self.config.interval
        );

        let mut ticker = interval(self.config.interval);

        // Skip the first immediate tick - let the server start up first
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.deliver_batch().await {
                error!("Notification delivery failed: {}", e);
            }
        }
    }

    async fn deliver_batch(&self) -> Result<(), sqlx::Error> {
        let pending =
            db::achievements::pending_notifications(&self.pool, self.config.batch_size).await?;

        if pending.is_empty() {
            return Ok(());
        }

        info!("Delivering {} unlock notifications", pending.len());

        for unlock in pending {
            if let Err(e) = self
                .notifier
                .email
                .send_achievement_unlocked(
                    &unlock.user_email,
                    &unlock.user_name,
                    &unlock.achievement_title,
                    &unlock.achievement_description,
                )
                .await
            {
                warn!("Email delivery failed for {}: {}", unlock.user_email, e);
            }

            self.notifier
                .push_to_user(
                    &self.pool,
                    unlock.user_id,
                    "Achievement unlocked! 🏆",
                    &unlock.achievement_title,
                )
                .await;

            db::achievements::mark_notified(&self.pool, unlock.user_id, unlock.achievement_id)
                .await?;
        }

        Ok(())
    }
}
