//! Local SQLite database for bridge-crm
//!
//! Holds the sync ledger only; contacts themselves live in the CRM.

pub mod sync_ledger;

pub use sync_ledger::{failures_for_run, last_sync, record_sync_run, SyncRunSummary};

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if needed) the ledger database and its tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Private in-memory database with the ledger tables
///
/// A single connection, since every new `:memory:` connection is a
/// separate database.
pub async fn init_in_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_runs (
            run_id TEXT PRIMARY KEY,
            mode TEXT NOT NULL,
            total INTEGER NOT NULL,
            succeeded INTEGER NOT NULL,
            failed INTEGER NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_failures (
            run_id TEXT NOT NULL REFERENCES sync_runs(run_id),
            item_index INTEGER NOT NULL,
            email TEXT,
            reason TEXT NOT NULL,
            contact TEXT NOT NULL,
            PRIMARY KEY (run_id, item_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (sync_runs, sync_failures)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_database_created_with_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("bridge-crm.db");

        let pool = init_database_pool(&path).await.unwrap();
        assert!(path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_runs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = init_in_memory_pool().await.unwrap();
        init_tables(&pool).await.unwrap();
    }
}
