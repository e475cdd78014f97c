//! Member persistence
//!
//! A member is created once, on first sight of its external id, and
//! updated (never re-created) on subsequent reconciliation passes.
//! Members are deactivated rather than deleted.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Member record as the importer sees it
#[derive(Debug, Clone)]
pub struct Member {
    pub id: Uuid,
    pub ep_id: String,
    pub first_name: String,
    pub last_name: String,
    pub slug: String,
    pub country_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub profile_url: Option<String>,
    pub photo_url: Option<String>,
    pub attendance_pct: Option<i64>,
    pub votes_cast: i64,
    pub votes_total: i64,
    pub partial_term: bool,
    pub special_role: Option<String>,
    pub sick_leave: bool,
}

/// Look up a member's internal id by external id
pub async fn find_by_ep_id(pool: &SqlitePool, ep_id: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM members WHERE ep_id = ?")
        .bind(ep_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            Ok(Some(Uuid::parse_str(&id_str)?))
        }
        None => Ok(None),
    }
}

/// External id currently owning a slug, for collision detection
pub async fn slug_owner(pool: &SqlitePool, slug: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT ep_id FROM members WHERE slug = ? LIMIT 1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get("ep_id")))
}

/// Create a member or, when the external id already exists, update the
/// mutable fields in place. Returns (internal id, created flag).
pub async fn upsert(pool: &SqlitePool, member: &Member) -> Result<(Uuid, bool)> {
    sqlx::query(
        r#"
        INSERT INTO members (
            id, ep_id, first_name, last_name, slug, country_id, party_id,
            profile_url, photo_url, attendance_pct, votes_cast, votes_total,
            partial_term, special_role, sick_leave, active,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1,
                  CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(ep_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            slug = excluded.slug,
            country_id = excluded.country_id,
            party_id = excluded.party_id,
            profile_url = excluded.profile_url,
            photo_url = excluded.photo_url,
            attendance_pct = excluded.attendance_pct,
            votes_cast = excluded.votes_cast,
            votes_total = excluded.votes_total,
            partial_term = excluded.partial_term,
            special_role = excluded.special_role,
            sick_leave = excluded.sick_leave,
            active = 1,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(member.id.to_string())
    .bind(&member.ep_id)
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(&member.slug)
    .bind(member.country_id.map(|id| id.to_string()))
    .bind(member.party_id.map(|id| id.to_string()))
    .bind(&member.profile_url)
    .bind(&member.photo_url)
    .bind(member.attendance_pct)
    .bind(member.votes_cast)
    .bind(member.votes_total)
    .bind(member.partial_term as i64)
    .bind(&member.special_role)
    .bind(member.sick_leave as i64)
    .execute(pool)
    .await?;

    // sqlite reports one affected row either way; resolve the canonical id
    // through the unique ep_id instead.
    let existing = find_by_ep_id(pool, &member.ep_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("member vanished after upsert: {}", member.ep_id))?;
    Ok((existing, existing == member.id))
}

/// Write recomputed attendance figures for one member
pub async fn update_attendance(
    pool: &SqlitePool,
    member_id: Uuid,
    votes_cast: i64,
    votes_total: i64,
    attendance_pct: Option<i64>,
) -> Result<()> {
    sqlx::query(
        "UPDATE members
         SET votes_cast = ?, votes_total = ?, attendance_pct = ?,
             updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(votes_cast)
    .bind(votes_total)
    .bind(attendance_pct)
    .bind(member_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// All (internal id, ep_id) pairs, for backfill passes
pub async fn list_ids(pool: &SqlitePool) -> Result<Vec<(Uuid, String)>> {
    let rows = sqlx::query("SELECT id, ep_id FROM members")
        .fetch_all(pool)
        .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let id_str: String = row.get("id");
        out.push((Uuid::parse_str(&id_str)?, row.get("ep_id")));
    }
    Ok(out)
}
