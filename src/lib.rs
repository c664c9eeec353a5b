//! WordPress REST API client.
//!
//! Pulls posts from a remote site's REST API and imports them into a local
//! store, or pushes a post to a remote site.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod import;
pub mod post;
pub mod store;
pub mod url_builder;

pub use client::{Fetched, PushResponse, WpClient};
pub use error::ClientError;
pub use import::{Importer, PendingTerms, TermsEvent, TermsListener};
pub use post::{translate, LocalPostFields, RemotePost, Translated};
pub use store::{ImportIdPolicy, PostStore, SqlitePostStore};
pub use url_builder::{build_listing_url, Filters, PostTypes};
