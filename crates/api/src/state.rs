//! Application state

use common::Config;
use engine::{ProgressionEngine, ReviewWorkflow};
use services::{Notifier, StorageClient};
use sqlx::PgPool;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub progression: ProgressionEngine,
    pub review: ReviewWorkflow,
    pub storage: StorageClient,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, notifier: Notifier) -> Self {
        let progression = ProgressionEngine::new(pool.clone());
        let review = ReviewWorkflow::new(pool.clone(), notifier);
        let storage = StorageClient::new(
            config.storage_api_url.clone(),
            config.storage_api_key.clone(),
        );
        Self {
            config,
            pool,
            progression,
            review,
            storage,
        }
    }
}
