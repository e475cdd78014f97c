//! Read-only database access

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Connect to the rollcall database in read-only mode.
///
/// `mode=ro` makes sqlite reject every write on this connection. The
/// importer may still be writing concurrently, so the file is not opened
/// immutable; WAL lets readers proceed alongside it.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found: {}\nRun rollcall-ingest first to create and populate it.",
            db_path.display()
        );
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to database in read-only mode")?;

    Ok(pool)
}
