//! Transactional email client
//!
//! Talks to an HTTP mail API (Resend-style `POST /emails`). When no API URL
//! is configured, sends become logged no-ops so development environments
//! run without a mail account.

use serde_json::json;
use tracing::debug;

use crate::ServiceError;

#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
    from: String,
}

impl EmailClient {
    pub fn new(api_url: Option<String>, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }

    /// Send one HTML email
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), ServiceError> {
        let Some(ref url) = self.api_url else {
            debug!("Mail disabled, skipping \"{}\" to {}", subject, to);
            return Ok(());
        };

        let payload = json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let mut request = self.client.post(url).json(&payload);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Notify a player their submission was reviewed
    pub async fn send_review_decision(
        &self,
        to: &str,
        name: &str,
        mission_title: &str,
        approved: bool,
        comment: Option<&str>,
    ) -> Result<(), ServiceError> {
        let (subject, verdict) = if approved {
            ("Your mission was approved! 🌵", "was approved")
        } else {
            ("About your mission submission", "was not approved")
        };

        let comment_html = comment
            .map(|c| format!("<p><em>Reviewer note:</em> {}</p>", c))
            .unwrap_or_default();

        let html = format!(
            "<h2>Hello, {}!</h2>\
             <p>Your submission for the mission <strong>{}</strong> {}.</p>\
             {}\
             <p>Keep exploring the Caatinga!</p>",
            name, mission_title, verdict, comment_html
        );

        self.send(to, subject, &html).await
    }

    /// Notify a player of an unlocked achievement
    pub async fn send_achievement_unlocked(
        &self,
        to: &str,
        name: &str,
        title: &str,
        description: &str,
    ) -> Result<(), ServiceError> {
        let html = format!(
            "<h2>Congratulations, {}! 🏆</h2>\
             <p>You unlocked the achievement <strong>{}</strong>.</p>\
             <p>{}</p>",
            name, title, description
        );

        self.send(to, &format!("Achievement unlocked: {}", title), &html)
            .await
    }
}
