//! Vote persistence
//!
//! A roll-call vote is identified by the parliament's external vote id.
//! The first row to claim an external id wins; later imports carrying the
//! same id (possibly with a different title) are skipped, which keeps
//! re-runs and overlapping source files from duplicating votes.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Vote record
#[derive(Debug, Clone)]
pub struct Vote {
    pub id: Uuid,
    pub ep_vote_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub total_for: i64,
    pub total_against: i64,
    pub total_abstain: i64,
}

/// Look up a vote's internal id by external vote id
pub async fn find_by_ep_vote_id<'e, E>(executor: E, ep_vote_id: &str) -> Result<Option<Uuid>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row = sqlx::query("SELECT id FROM votes WHERE ep_vote_id = ?")
        .bind(ep_vote_id)
        .fetch_optional(executor)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            Ok(Some(Uuid::parse_str(&id_str)?))
        }
        None => Ok(None),
    }
}

/// Insert a vote at most once per external id; the stored row keeps its
/// first-seen title and totals. Returns true when a row was created.
/// Generic over the executor so batches can run inside a transaction.
pub async fn insert_ignore<'e, E>(executor: E, vote: &Vote) -> Result<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO votes (
            id, ep_vote_id, date, title, description, source_url,
            total_for, total_against, total_abstain, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(ep_vote_id) DO NOTHING
        "#,
    )
    .bind(vote.id.to_string())
    .bind(&vote.ep_vote_id)
    .bind(vote.date.format("%Y-%m-%d").to_string())
    .bind(&vote.title)
    .bind(&vote.description)
    .bind(&vote.source_url)
    .bind(vote.total_for)
    .bind(vote.total_against)
    .bind(vote.total_abstain)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Date of the most recent stored vote, anchor for the attendance window
pub async fn newest_date(pool: &SqlitePool) -> Result<Option<NaiveDate>> {
    let row = sqlx::query("SELECT MAX(date) AS newest FROM votes")
        .fetch_one(pool)
        .await?;

    let newest: Option<String> = row.get("newest");
    match newest {
        Some(s) => Ok(Some(NaiveDate::parse_from_str(&s, "%Y-%m-%d")?)),
        None => Ok(None),
    }
}
