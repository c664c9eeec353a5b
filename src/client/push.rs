use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::WpClient;
use crate::error::ClientError;

/// What the remote site answered to a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResponse {
    pub status: u16,
    pub body: String,
}

impl PushResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

impl WpClient {
    /// POST a post record to `remote_url` as JSON.
    ///
    /// `auth_token` is sent verbatim as the `Authorization` header. Any HTTP
    /// response, including error statuses, is returned to the caller.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `post` does not serialize to a JSON object
    /// - `Transport` if the request fails or times out
    pub async fn push<T: Serialize + ?Sized>(
        &self,
        post: &T,
        auth_token: &str,
        remote_url: &str,
        timeout: Option<Duration>,
    ) -> Result<PushResponse, ClientError> {
        let body = serde_json::to_value(post)
            .ok()
            .filter(Value::is_object)
            .ok_or(ClientError::InvalidInput { function: "push" })?;

        let timeout = timeout.unwrap_or(self.config.push_timeout);
        debug!(url = %remote_url, timeout_secs = timeout.as_secs(), "Pushing post");

        let transport = |source: reqwest::Error| ClientError::Transport {
            url: remote_url.to_string(),
            source,
        };

        let response = self
            .push_http
            .post(remote_url)
            .header(AUTHORIZATION, auth_token)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if status.is_success() {
            info!(url = %remote_url, status = %status, "Pushed post");
        } else {
            warn!(url = %remote_url, status = %status, "Remote rejected pushed post");
        }

        Ok(PushResponse {
            status: status.as_u16(),
            body,
        })
    }
}
