//! The local side of an import: where translated posts are written.

mod migrations;
mod sqlite;

pub use sqlite::{SqlitePostStore, StoredPost};

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::post::LocalPostFields;

/// What to do with the remote identifier carried as `import_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportIdPolicy {
    /// Use the remote id when no local post has it, otherwise allocate a new id.
    #[default]
    ReuseIfFree,
    /// Use the remote id even if that replaces an existing local post.
    Overwrite,
    /// Ignore the remote id and always allocate a new one.
    AlwaysCreate,
}

/// Create-or-update operation for local posts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Store a translated post and return its local identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the post cannot be written.
    async fn insert_post(&self, fields: &LocalPostFields, policy: ImportIdPolicy) -> Result<i64>;
}

#[async_trait]
impl<T: PostStore + ?Sized> PostStore for Arc<T> {
    async fn insert_post(&self, fields: &LocalPostFields, policy: ImportIdPolicy) -> Result<i64> {
        (**self).insert_post(fields, policy).await
    }
}
