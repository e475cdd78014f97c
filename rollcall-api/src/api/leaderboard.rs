//! Attendance leaderboard endpoints
//!
//! Ranks members by attendance over the aggregation window. The bottom
//! view applies stricter exclusions so presiding officers, members on
//! sick leave, partial terms, and near-new members never appear in it;
//! exclusion is view-time only, the rows themselves stay untouched.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;

use crate::pagination;
use crate::AppState;

/// Members with at most this many window votes are excluded from the
/// bottom ranking, so brand-new members are not penalized.
pub const BOTTOM_MIN_VOTES: i64 = 100;

const MEMBER_JOINS: &str = "\
    FROM members m \
    LEFT JOIN parties p ON m.party_id = p.id \
    LEFT JOIN countries c ON m.country_id = c.id";

/// Every ranking requires an identifiable, active member with window data
const BASE_EXCLUSIONS: &str =
    "m.ep_id != '' AND m.active = 1 AND m.sick_leave = 0 AND m.votes_total > 0";

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Name substring filter
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardItem {
    pub rank: i64,
    pub ep_id: String,
    pub name: String,
    pub slug: String,
    pub country: Option<String>,
    pub group: Option<String>,
    pub party: Option<String>,
    pub attendance_pct: Option<i64>,
    pub votes_cast: i64,
    pub votes_total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub items: Vec<LeaderboardItem>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// GET /api/leaderboard
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, LeaderboardError> {
    let order = order_clause(
        params.sort_by.as_deref().unwrap_or("attendance"),
        params.sort_order.as_deref(),
    )?;
    run_ranking(&state, params, BASE_EXCLUSIONS.to_string(), order).await
}

/// GET /api/leaderboard/bottom
pub async fn leaderboard_bottom(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, LeaderboardError> {
    let exclusions = format!(
        "{} AND m.special_role IS NULL AND m.partial_term = 0 AND m.votes_total > {}",
        BASE_EXCLUSIONS, BOTTOM_MIN_VOTES
    );
    // Bottom view is ascending attendance by definition, not sortable
    let order = "ORDER BY m.attendance_pct ASC, m.ep_id ASC".to_string();
    run_ranking(&state, params, exclusions, order).await
}

async fn run_ranking(
    state: &AppState,
    params: LeaderboardParams,
    exclusions: String,
    order: String,
) -> Result<Json<LeaderboardResponse>, LeaderboardError> {
    let pagination = pagination::clamp(params.page, params.page_size);

    let mut where_sql = format!("WHERE {}", exclusions);
    let name_bind = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));
    if name_bind.is_some() {
        where_sql.push_str(" AND (m.first_name || ' ' || m.last_name) LIKE ?");
    }

    let count_sql = format!("SELECT COUNT(*) {} {}", MEMBER_JOINS, where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(bind) = &name_bind {
        count_query = count_query.bind(bind);
    }
    let total = count_query
        .fetch_one(&state.db)
        .await
        .map_err(|e| LeaderboardError::DatabaseError(e.to_string()))?;

    let select_sql = format!(
        "SELECT m.ep_id, m.first_name, m.last_name, m.slug, \
                m.attendance_pct, m.votes_cast, m.votes_total, m.special_role, \
                p.abbreviation AS group_abbr, p.name AS party_name, \
                c.name AS country_name \
         {} {} {} LIMIT ? OFFSET ?",
        MEMBER_JOINS, where_sql, order
    );
    let mut select_query = sqlx::query(&select_sql);
    if let Some(bind) = &name_bind {
        select_query = select_query.bind(bind);
    }
    let rows = select_query
        .bind(pagination.page_size)
        .bind(pagination.offset)
        .fetch_all(&state.db)
        .await
        .map_err(|e| LeaderboardError::DatabaseError(e.to_string()))?;

    let items = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let first: String = row.get("first_name");
            let last: String = row.get("last_name");
            LeaderboardItem {
                rank: pagination::rank(&pagination, index),
                ep_id: row.get("ep_id"),
                name: crate::api::search::display_name(&first, &last),
                slug: row.get("slug"),
                country: row.get("country_name"),
                group: row.get("group_abbr"),
                party: row.get("party_name"),
                attendance_pct: row.get("attendance_pct"),
                votes_cast: row.get("votes_cast"),
                votes_total: row.get("votes_total"),
                special_role: row.get("special_role"),
            }
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        items,
        page: pagination.page,
        page_size: pagination.page_size,
        total,
    }))
}

/// Map a sort key to its ORDER BY clause. Ties always break on the
/// stable external id so pagination never shuffles between requests.
fn order_clause(sort_by: &str, sort_order: Option<&str>) -> Result<String, LeaderboardError> {
    let (key, default_desc) = match sort_by {
        "attendance" => ("m.attendance_pct", true),
        "party" => ("p.name", false),
        "country" => ("c.name", false),
        "name" => ("m.first_name || ' ' || m.last_name", false),
        other => return Err(LeaderboardError::InvalidSort(other.to_string())),
    };
    let dir = match sort_order {
        Some("asc") => "ASC",
        Some("desc") => "DESC",
        None => {
            if default_desc {
                "DESC"
            } else {
                "ASC"
            }
        }
        Some(other) => return Err(LeaderboardError::InvalidSort(other.to_string())),
    };
    Ok(format!("ORDER BY {} {}, m.ep_id ASC", key, dir))
}

#[derive(Debug)]
pub enum LeaderboardError {
    InvalidSort(String),
    DatabaseError(String),
}

impl IntoResponse for LeaderboardError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            LeaderboardError::InvalidSort(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid sort parameter: {}", value),
            ),
            LeaderboardError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_defaults() {
        assert_eq!(
            order_clause("attendance", None).unwrap(),
            "ORDER BY m.attendance_pct DESC, m.ep_id ASC"
        );
        assert_eq!(
            order_clause("name", None).unwrap(),
            "ORDER BY m.first_name || ' ' || m.last_name ASC, m.ep_id ASC"
        );
    }

    #[test]
    fn test_order_clause_rejects_unknown_keys() {
        assert!(order_clause("salary", None).is_err());
        assert!(order_clause("attendance", Some("sideways")).is_err());
    }
}
