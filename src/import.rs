//! Importing remote posts into a local [`PostStore`].

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::post::{translate, RemotePost};
use crate::store::{ImportIdPolicy, PostStore};

/// Taxonomy data split off an imported post.
#[derive(Debug, Clone, PartialEq)]
pub struct TermsEvent {
    pub terms: Value,
    /// Local id the post was stored under.
    pub post_id: i64,
    /// Id of the post on the remote site, if it had one.
    pub import_id: Option<Value>,
}

/// Receives the terms of every imported post. Term assignment is entirely
/// up to the listener.
#[async_trait]
pub trait TermsListener: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the terms could not be handled.
    async fn on_terms(&self, event: &TermsEvent) -> Result<()>;
}

/// Listener that queues events for the caller to drain.
#[derive(Debug, Clone, Default)]
pub struct PendingTerms {
    events: Arc<Mutex<Vec<TermsEvent>>>,
}

impl PendingTerms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued event, oldest first.
    ///
    /// Events queued before a panic poisoned the lock are still returned.
    #[must_use]
    pub fn drain(&self) -> Vec<TermsEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}

#[async_trait]
impl TermsListener for PendingTerms {
    async fn on_terms(&self, event: &TermsEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Maps remote posts onto local insert fields and hands them to a store.
pub struct Importer<S> {
    store: S,
    policy: ImportIdPolicy,
    listeners: Vec<Arc<dyn TermsListener>>,
}

impl<S: PostStore> Importer<S> {
    #[must_use]
    pub fn new(store: S, policy: ImportIdPolicy) -> Self {
        Self {
            store,
            policy,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for the terms of each imported post.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn TermsListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Import one decoded remote post and return its local id.
    ///
    /// Listeners run after the post is stored; a listener failure is
    /// reported but the post stays stored.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `post` is not a JSON object
    /// - `MissingField` if the post has no author id
    /// - `Store` if the store rejects the insert
    /// - `Listener` if a terms listener fails
    pub async fn import(&self, post: Value) -> Result<i64, ClientError> {
        let remote = RemotePost::try_from(post)?;
        let translated = translate(remote)?;

        let post_id = self
            .store
            .insert_post(&translated.fields, self.policy)
            .await
            .map_err(ClientError::Store)?;

        info!(
            post_id,
            import_id = ?translated.import_id,
            policy = ?self.policy,
            "Imported post"
        );

        let event = TermsEvent {
            terms: translated.terms,
            post_id,
            import_id: translated.import_id,
        };
        for listener in &self.listeners {
            listener
                .on_terms(&event)
                .await
                .map_err(|source| ClientError::Listener { post_id, source })?;
        }

        Ok(post_id)
    }

    /// Import every post in a listing response.
    ///
    /// An array yields one result per element; any other value is imported
    /// as a single post. A failing post does not stop the rest.
    pub async fn import_all(&self, listing: Value) -> Vec<Result<i64, ClientError>> {
        let posts = match listing {
            Value::Array(posts) => posts,
            other => vec![other],
        };
        debug!(count = posts.len(), "Importing posts");

        let mut results = Vec::with_capacity(posts.len());
        for post in posts {
            let result = self.import(post).await;
            if let Err(e) = &result {
                warn!("Failed to import post: {e}");
            }
            results.push(result);
        }
        results
    }
}
