use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use super::{migrations, ImportIdPolicy, PostStore};
use crate::import::{TermsEvent, TermsListener};
use crate::post::LocalPostFields;

/// A post row as stored locally.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredPost {
    pub id: i64,
    pub post_title: Option<String>,
    pub post_content: Option<String>,
    pub post_name: Option<String>,
    pub post_status: Option<String>,
    pub post_parent: Option<i64>,
    pub post_excerpt: Option<String>,
    pub post_date: Option<String>,
    pub post_type: String,
    pub post_author: Option<i64>,
    pub import_id: Option<i64>,
    pub extra_json: Option<String>,
    pub imported_at: String,
}

/// SQLite-backed post store. Also records imported terms when registered
/// as a [`TermsListener`].
#[derive(Debug, Clone)]
pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    /// Open (or create) the store at `path`, running migrations if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or migrations fail.
    pub async fn new(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open post store at {}", path.display()))?;

        migrations::run(&pool).await?;
        info!(path = %path.display(), "Post store ready");

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch a stored post by local id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_post(&self, id: i64) -> Result<Option<StoredPost>> {
        sqlx::query_as::<_, StoredPost>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post")
    }

    /// Number of stored posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_posts(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;
        Ok(count)
    }

    /// Terms recorded for a post as `(taxonomy, term)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_terms(&self, post_id: i64) -> Result<Vec<(String, String)>> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT taxonomy, term FROM post_terms WHERE post_id = ? ORDER BY taxonomy, term",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get terms")
    }
}

const INSERT_POST: &str = r"
    INSERT INTO posts (id, post_title, post_content, post_name, post_status, post_parent,
                       post_excerpt, post_date, post_type, post_author, import_id, extra_json)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, 'post'), ?, ?, ?)
";

const OVERWRITE_CLAUSE: &str = r"
    ON CONFLICT(id) DO UPDATE SET
        post_title = excluded.post_title,
        post_content = excluded.post_content,
        post_name = excluded.post_name,
        post_status = excluded.post_status,
        post_parent = excluded.post_parent,
        post_excerpt = excluded.post_excerpt,
        post_date = excluded.post_date,
        post_type = excluded.post_type,
        post_author = excluded.post_author,
        import_id = excluded.import_id,
        extra_json = excluded.extra_json,
        imported_at = datetime('now')
";

/// Only `Overwrite` may replace an existing row; for the other policies an
/// id collision is a constraint error.
fn insert_sql(policy: ImportIdPolicy) -> String {
    match policy {
        ImportIdPolicy::Overwrite => format!("{INSERT_POST}{OVERWRITE_CLAUSE}"),
        ImportIdPolicy::ReuseIfFree | ImportIdPolicy::AlwaysCreate => INSERT_POST.to_string(),
    }
}

async fn id_taken(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to look up post id")?;
    Ok(row.is_some())
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn insert_post(&self, fields: &LocalPostFields, policy: ImportIdPolicy) -> Result<i64> {
        let import_id = fields.import_id();
        let unmapped = fields.unmapped();
        if !unmapped.is_empty() {
            warn!(
                fields = ?unmapped,
                "Post fields do not fit their columns, keeping them in extra_json"
            );
        }
        let extra = fields.extra();
        let extra_json = if extra.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&extra).context("Failed to encode extra fields")?)
        };

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let explicit_id = match (policy, import_id.filter(|id| *id > 0)) {
            (ImportIdPolicy::AlwaysCreate, _) | (_, None) => None,
            (ImportIdPolicy::Overwrite, Some(id)) => {
                if id_taken(&mut tx, id).await? {
                    warn!(post_id = id, "Overwriting existing post with imported post");
                }
                Some(id)
            }
            (ImportIdPolicy::ReuseIfFree, Some(id)) => {
                if id_taken(&mut tx, id).await? {
                    debug!(import_id = id, "Import id already in use, allocating a new id");
                    None
                } else {
                    Some(id)
                }
            }
        };

        let result = sqlx::query(&insert_sql(policy))
        .bind(explicit_id)
        .bind(fields.text("post_title"))
        .bind(fields.text("post_content"))
        .bind(fields.text("post_name"))
        .bind(fields.text("post_status"))
        .bind(fields.integer("post_parent"))
        .bind(fields.text("post_excerpt"))
        .bind(fields.text("post_date"))
        .bind(fields.text("post_type"))
        .bind(fields.integer("post_author"))
        .bind(import_id)
        .bind(extra_json)
        .execute(&mut *tx)
        .await
        .context("Failed to insert post")?;

        let id = explicit_id.unwrap_or_else(|| result.last_insert_rowid());

        tx.commit().await.context("Failed to commit post insert")?;

        Ok(id)
    }
}

#[async_trait]
impl TermsListener for SqlitePostStore {
    async fn on_terms(&self, event: &TermsEvent) -> Result<()> {
        let assignments = flatten_terms(&event.terms);

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM post_terms WHERE post_id = ?")
            .bind(event.post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear terms")?;

        for (taxonomy, term) in &assignments {
            sqlx::query("INSERT OR IGNORE INTO post_terms (post_id, taxonomy, term) VALUES (?, ?, ?)")
                .bind(event.post_id)
                .bind(taxonomy)
                .bind(term)
                .execute(&mut *tx)
                .await
                .context("Failed to insert term")?;
        }

        tx.commit().await.context("Failed to commit terms")?;

        debug!(
            post_id = event.post_id,
            terms = assignments.len(),
            "Recorded terms"
        );
        Ok(())
    }
}

/// Flatten a `{taxonomy: [term, ...]}` record into `(taxonomy, term)` pairs.
///
/// A term is either a string or an object with a `name` (or `slug`).
fn flatten_terms(terms: &Value) -> Vec<(String, String)> {
    let Value::Object(taxonomies) = terms else {
        let unexpected = match terms {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            _ => true,
        };
        if unexpected {
            warn!("Terms are not keyed by taxonomy, skipping");
        }
        return Vec::new();
    };

    let mut out = Vec::new();
    for (taxonomy, entries) in taxonomies {
        let entries = match entries {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        for entry in entries {
            let name = match entry {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("name")
                    .or_else(|| obj.get("slug"))
                    .and_then(Value::as_str)
                    .map(String::from),
                _ => None,
            };
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                out.push((taxonomy.clone(), name));
            }
        }
    }
    out
}
