//! Object storage client
//!
//! Uploads pass-through files (photo submissions, badge art) to an HTTP
//! storage API and returns the public URL plus the provider's id, which is
//! what deletion takes.

use serde::Deserialize;
use tracing::debug;

use crate::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl StorageClient {
    pub fn new(api_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some()
    }

    /// Upload a file, returning its public URL and storage id
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, ServiceError> {
        let Some(ref url) = self.api_url else {
            return Err(ServiceError::Disabled);
        };

        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(format!("{}/upload", url)).multipart(form);
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

        Ok(resp.json().await?)
    }

    /// Delete a previously uploaded object
    pub async fn delete(&self, public_id: &str) -> Result<(), ServiceError> {
        let Some(ref url) = self.api_url else {
            return Err(ServiceError::Disabled);
        };

        let mut request = self
            .client
            .delete(format!("{}/objects/{}", url, public_id));
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
}
