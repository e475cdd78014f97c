//! Database initialization
//!
//! Creates the sqlite database on first run and brings the schema up
//! idempotently (`CREATE TABLE IF NOT EXISTS`), so every service can open
//! the store without coordination.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while the importer writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory pool for tests. Capped at a single connection: each sqlite
/// `:memory:` connection is otherwise a distinct database.
pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (idempotent, safe to call repeatedly)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_countries_table(pool).await?;
    create_parties_table(pool).await?;
    create_members_table(pool).await?;
    create_votes_table(pool).await?;
    create_ballots_table(pool).await?;
    Ok(())
}

async fn create_countries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS countries (
            id TEXT PRIMARY KEY,
            code TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            slug TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_parties_table(pool: &SqlitePool) -> Result<()> {
    // Party identity keys on the (eu_group, national name) pair: many
    // national parties share one EU group.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parties (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            abbreviation TEXT,
            eu_group TEXT NOT NULL,
            slug TEXT NOT NULL,
            country_id TEXT REFERENCES countries(id),
            UNIQUE(eu_group, name)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            ep_id TEXT UNIQUE NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            slug TEXT NOT NULL,
            country_id TEXT REFERENCES countries(id),
            party_id TEXT REFERENCES parties(id),
            profile_url TEXT,
            photo_url TEXT,
            attendance_pct INTEGER,
            votes_cast INTEGER NOT NULL DEFAULT 0,
            votes_total INTEGER NOT NULL DEFAULT 0,
            partial_term INTEGER NOT NULL DEFAULT 0,
            special_role TEXT,
            sick_leave INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_slug ON members(slug)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id TEXT PRIMARY KEY,
            ep_vote_id TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            source_url TEXT,
            total_for INTEGER NOT NULL DEFAULT 0,
            total_against INTEGER NOT NULL DEFAULT 0,
            total_abstain INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_date ON votes(date)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_ballots_table(pool: &SqlitePool) -> Result<()> {
    // One choice per member per vote; re-imports hit the primary key and
    // are discarded (first write wins).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ballots (
            member_id TEXT NOT NULL REFERENCES members(id),
            vote_id TEXT NOT NULL REFERENCES votes(id),
            choice TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (member_id, vote_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ballots_vote ON ballots(vote_id)")
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = memory_pool().await.expect("memory pool");
        // Second pass must not fail on existing tables
        create_schema(&pool).await.expect("re-run schema");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(count >= 5);
    }

    #[tokio::test]
    async fn test_ballot_pair_is_unique() {
        let pool = memory_pool().await.expect("memory pool");

        sqlx::query("INSERT INTO members (id, ep_id, first_name, last_name, slug) VALUES ('m1', '1', 'A', 'B', 'a-b')")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO votes (id, ep_vote_id, date, title) VALUES ('v1', '10', '2025-01-01', 'T')")
            .execute(&pool).await.unwrap();

        sqlx::query("INSERT INTO ballots (member_id, vote_id, choice) VALUES ('m1', 'v1', 'for')")
            .execute(&pool).await.unwrap();
        let dup = sqlx::query("INSERT INTO ballots (member_id, vote_id, choice) VALUES ('m1', 'v1', 'against')")
            .execute(&pool)
            .await;
        assert!(dup.is_err());
    }
}
