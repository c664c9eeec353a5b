//! Shared constants used across the client.

/// User agent sent with every request to a remote site.
pub const USER_AGENT: &str = concat!("wp-rest-client/", env!("CARGO_PKG_VERSION"));

/// Listing endpoint appended to a site's root URL.
pub const DEFAULT_ENDPOINT: &str = "/wp-json/posts";

/// Default post type when a listing names none.
pub const DEFAULT_POST_TYPE: &str = "post";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_PUSH_MAX_REDIRECTS: usize = 5;
