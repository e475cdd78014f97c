//! Country persistence
//!
//! Countries are created lazily on first reference and immutable afterwards
//! except for display-name drift.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Country record
#[derive(Debug, Clone)]
pub struct Country {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub slug: String,
}

impl Country {
    pub fn new(code: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            // Code doubles as the slug to sidestep display-name collisions
            slug: code.to_lowercase(),
            code,
            name,
        }
    }
}

/// Look up a country by ISO-2 code
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Country>> {
    let row = sqlx::query("SELECT id, code, name, slug FROM countries WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            Ok(Some(Country {
                id: Uuid::parse_str(&id_str)?,
                code: row.get("code"),
                name: row.get("name"),
                slug: row.get("slug"),
            }))
        }
        None => Ok(None),
    }
}

/// Insert a country; returns the existing row's id if the code is taken
/// (concurrent creators resolve through the unique constraint).
pub async fn create(pool: &SqlitePool, country: &Country) -> Result<Uuid> {
    let result = sqlx::query(
        "INSERT INTO countries (id, code, name, slug) VALUES (?, ?, ?, ?)
         ON CONFLICT(code) DO NOTHING",
    )
    .bind(country.id.to_string())
    .bind(&country.code)
    .bind(&country.name)
    .bind(&country.slug)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let existing = find_by_code(pool, &country.code)
            .await?
            .ok_or_else(|| anyhow::anyhow!("country vanished after conflict: {}", country.code))?;
        return Ok(existing.id);
    }
    Ok(country.id)
}
