//! Party persistence
//!
//! Party identity keys on the `(eu_group, national name)` pair: many
//! national parties share one EU group, and one national party can in
//! principle change group between terms.

use anyhow::Result;
use rollcall_common::identity::slugify;
use rollcall_common::reference::eu_group_abbreviation;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Party record
#[derive(Debug, Clone)]
pub struct Party {
    pub id: Uuid,
    /// National party name (falls back to the EU group name when the
    /// source carries no national party)
    pub name: String,
    pub abbreviation: String,
    pub eu_group: String,
    pub slug: String,
    pub country_id: Option<Uuid>,
}

impl Party {
    pub fn new(eu_group: String, national_party: String, country_id: Option<Uuid>) -> Self {
        let name = if national_party.is_empty() {
            eu_group.clone()
        } else {
            national_party
        };
        Self {
            id: Uuid::new_v4(),
            abbreviation: eu_group_abbreviation(&eu_group),
            slug: slugify(&name),
            name,
            eu_group,
            country_id,
        }
    }
}

/// Look up a party by its identity pair
pub async fn find_by_group_and_name(
    pool: &SqlitePool,
    eu_group: &str,
    name: &str,
) -> Result<Option<Party>> {
    let row = sqlx::query(
        "SELECT id, name, abbreviation, eu_group, slug, country_id
         FROM parties WHERE eu_group = ? AND name = ?",
    )
    .bind(eu_group)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            let country_id_str: Option<String> = row.get("country_id");
            Ok(Some(Party {
                id: Uuid::parse_str(&id_str)?,
                name: row.get("name"),
                abbreviation: row.get("abbreviation"),
                eu_group: row.get("eu_group"),
                slug: row.get("slug"),
                country_id: country_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
            }))
        }
        None => Ok(None),
    }
}

/// Insert a party; returns the existing row's id on identity conflict.
pub async fn create(pool: &SqlitePool, party: &Party) -> Result<Uuid> {
    let result = sqlx::query(
        "INSERT INTO parties (id, name, abbreviation, eu_group, slug, country_id)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(eu_group, name) DO NOTHING",
    )
    .bind(party.id.to_string())
    .bind(&party.name)
    .bind(&party.abbreviation)
    .bind(&party.eu_group)
    .bind(&party.slug)
    .bind(party.country_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let existing = find_by_group_and_name(pool, &party.eu_group, &party.name)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("party vanished after conflict: {}/{}", party.eu_group, party.name)
            })?;
        return Ok(existing.id);
    }
    Ok(party.id)
}
