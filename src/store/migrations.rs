use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating posts and terms tables");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_title TEXT,
            post_content TEXT,
            post_name TEXT,
            post_status TEXT,
            post_parent INTEGER,
            post_excerpt TEXT,
            post_date TEXT,
            post_type TEXT NOT NULL DEFAULT 'post',
            post_author INTEGER,
            import_id INTEGER,
            extra_json TEXT,
            imported_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create posts table")?;

    // Deleting a post removes its terms; overwrites keep the row, so the
    // terms listener clears stale terms itself
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS post_terms (
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            taxonomy TEXT NOT NULL,
            term TEXT NOT NULL,
            PRIMARY KEY (post_id, taxonomy, term)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create post_terms table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_import_id ON posts(import_id)")
        .execute(pool)
        .await
        .context("Failed to create import_id index")?;

    Ok(())
}
