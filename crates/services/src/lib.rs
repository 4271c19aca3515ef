//! Outbound service clients: transactional email, push notifications and
//! object storage. Every send is best-effort from the caller's point of
//! view — delivery failures are logged, never propagated into the primary
//! operation.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub mod delivery;
pub mod email;
pub mod push;
pub mod storage;

pub use delivery::{DeliveryConfig, DeliveryService};
pub use email::EmailClient;
pub use push::{PushClient, PushOutcome};
pub use storage::{StorageClient, StoredObject};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Client not configured")]
    Disabled,
}

/// The outbound channels handlers need, constructed once at startup and
/// cloned into tasks.
#[derive(Clone)]
pub struct Notifier {
    pub email: EmailClient,
    pub push: PushClient,
}

impl Notifier {
    pub fn new(config: &common::Config) -> Self {
        Self {
            email: EmailClient::new(
                config.mail_api_url.clone(),
                config.mail_api_key.clone(),
                config.mail_from.clone(),
            ),
            push: PushClient::new(config.push_api_url.clone(), config.push_server_key.clone()),
        }
    }

    /// Push a message to every device the user has registered. Tokens the
    /// provider reports invalid are deregistered on the spot.
    pub async fn push_to_user(&self, pool: &PgPool, user_id: Uuid, title: &str, body: &str) {
        let tokens = match db::devices::list_for_user(pool, user_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Could not load device tokens for {}: {}", user_id, e);
                return;
            }
        };

        for token in tokens {
            match self.push.send(&token, title, body).await {
                Ok(PushOutcome::InvalidToken) => {
                    info!("Deregistering invalid device token for {}", user_id);
                    if let Err(e) = db::devices::remove_token(pool, &token).await {
                        warn!("Could not deregister token: {}", e);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Push delivery failed for {}: {}", user_id, e),
            }
        }
    }
}
