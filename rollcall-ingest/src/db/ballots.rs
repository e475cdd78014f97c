//! Ballot persistence
//!
//! One ballot per (member, vote) pair, enforced by the table's primary
//! key. The first recorded choice wins; conflicting later rows are
//! silently skipped so that re-imports and overlapping bundles cannot
//! flip a stored choice.

use anyhow::Result;
use rollcall_common::Choice;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert a ballot; returns true when a row was created, false when the
/// pair already had one. Generic over the executor so batches can run
/// inside a transaction.
pub async fn insert_first_wins<'e, E>(
    executor: E,
    member_id: Uuid,
    vote_id: Uuid,
    choice: Choice,
) -> Result<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT OR IGNORE INTO ballots (member_id, vote_id, choice, created_at)
         VALUES (?, ?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(member_id.to_string())
    .bind(vote_id.to_string())
    .bind(choice.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Ballot counts inside a date window for one member: (total, cast)
pub async fn window_counts(
    pool: &SqlitePool,
    member_id: Uuid,
    from: &str,
    to: &str,
) -> Result<(i64, i64)> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN b.choice != 'absent' THEN 1 ELSE 0 END), 0) AS cast_count
        FROM ballots b
        JOIN votes v ON v.id = b.vote_id
        WHERE b.member_id = ? AND v.date >= ? AND v.date <= ?
        "#,
    )
    .bind(member_id.to_string())
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok((row.get("total"), row.get("cast_count")))
}
