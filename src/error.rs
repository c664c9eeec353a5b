use thiserror::Error;

/// Errors surfaced by the fetch, import and push operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure or timeout while talking to a remote site.
    #[error("the URL {url} could not be retrieved: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A post record was required but something else was given.
    #[error("the data passed to {function} must be a JSON object")]
    InvalidInput { function: &'static str },

    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },

    /// The response body was not valid JSON.
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The local post store rejected an insert.
    #[error("failed to store post: {0:#}")]
    Store(#[source] anyhow::Error),

    /// A terms listener failed after the post was stored.
    #[error("terms listener failed for post {post_id}: {source:#}")]
    Listener {
        post_id: i64,
        #[source]
        source: anyhow::Error,
    },
}

impl ClientError {
    /// Whether the failure happened on the wire rather than in local handling.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
