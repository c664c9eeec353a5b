use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::WpClient;
use crate::error::ClientError;
use crate::url_builder::{Filters, PostTypes};

/// Body of a fetched URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Json(Value),
    Raw(String),
}

impl Fetched {
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    #[must_use]
    pub fn into_raw(self) -> Option<String> {
        match self {
            Self::Raw(body) => Some(body),
            Self::Json(_) => None,
        }
    }
}

impl WpClient {
    /// GET `url` once and return its body, decoded as JSON when `decode` is set.
    ///
    /// The HTTP status is not checked: remote sites report API errors as JSON
    /// bodies, which are returned like any other body. Non-2xx statuses are
    /// logged.
    ///
    /// # Errors
    ///
    /// - `Transport` if the request fails or times out
    /// - `Decode` if `decode` is set and the body is not JSON
    pub async fn fetch(
        &self,
        url: &str,
        timeout: Option<Duration>,
        decode: bool,
    ) -> Result<Fetched, ClientError> {
        let body = self.get_body(url, timeout).await?;
        if decode {
            decode_body(url, &body).map(Fetched::Json)
        } else {
            Ok(Fetched::Raw(body))
        }
    }

    /// Fetch the configured site's post listing and decode it.
    ///
    /// # Errors
    ///
    /// Returns any error from building the URL, fetching or decoding it.
    pub async fn fetch_posts(
        &self,
        post_types: impl Into<PostTypes>,
        filters: Option<&Filters>,
    ) -> Result<Value, ClientError> {
        let url = self.listing_url(post_types, filters, None)?;
        let body = self.get_body(&url, None).await?;
        decode_body(&url, &body)
    }

    async fn get_body(&self, url: &str, timeout: Option<Duration>) -> Result<String, ClientError> {
        let timeout = timeout.unwrap_or(self.config.fetch_timeout);
        debug!(url = %url, timeout_secs = timeout.as_secs(), "Fetching");

        let transport = |source: reqwest::Error| ClientError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Remote returned non-success status");
        }

        response.text().await.map_err(transport)
    }
}

fn decode_body(url: &str, body: &str) -> Result<Value, ClientError> {
    serde_json::from_str(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}
