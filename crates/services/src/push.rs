//! Push notification client
//!
//! Sends per-device-token notifications through an FCM-compatible HTTP
//! endpoint. The provider's "not registered" errors are surfaced as
//! [`PushOutcome::InvalidToken`] so callers can deregister the device.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::ServiceError;

const DEFAULT_API_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Sent,
    /// The provider no longer recognizes this token
    InvalidToken,
    /// No server key configured; nothing was sent
    Skipped,
}

#[derive(Clone)]
pub struct PushClient {
    client: reqwest::Client,
    api_url: String,
    server_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    error: Option<String>,
}

impl PushClient {
    pub fn new(api_url: Option<String>, server_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            server_key,
        }
    }

    /// Send one notification to one device token
    pub async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
    ) -> Result<PushOutcome, ServiceError> {
        let Some(ref key) = self.server_key else {
            debug!("Push disabled, skipping \"{}\"", title);
            return Ok(PushOutcome::Skipped);
        };

        let payload = json!({
            "to": token,
            "notification": { "title": title, "body": body },
        });

        let resp = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, format!("key={}", key))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FcmResponse = resp.json().await?;
        let invalid = parsed.results.iter().any(|r| {
            matches!(
                r.error.as_deref(),
                Some("NotRegistered") | Some("InvalidRegistration")
            )
        });

        if invalid {
            Ok(PushOutcome::InvalidToken)
        } else {
            Ok(PushOutcome::Sent)
        }
    }
}
