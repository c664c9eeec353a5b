//! HTTP side of the client: listing URLs, fetching and pushing posts.

mod fetch;
mod push;

pub use fetch::Fetched;
pub use push::PushResponse;

use anyhow::{Context, Result};
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::error::ClientError;
use crate::url_builder::{build_listing_url, Filters, PostTypes};

/// Client for one remote site's REST API.
///
/// Every call makes a single request; nothing is retried.
#[derive(Clone)]
pub struct WpClient {
    http: Client,
    push_http: Client,
    config: Config,
}

impl WpClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.fetch_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let push_http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.push_timeout)
            .redirect(Policy::limited(config.push_max_redirects))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            push_http,
            config,
        })
    }

    /// Listing URL on `root_url`, or on the configured site when `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the resulting URL does not parse.
    pub fn listing_url(
        &self,
        post_types: impl Into<PostTypes>,
        filters: Option<&Filters>,
        root_url: Option<&str>,
    ) -> Result<String, ClientError> {
        let root = root_url.unwrap_or(&self.config.root_url);
        build_listing_url(post_types, filters, &self.config.endpoint, root)
    }
}
