//! Vote search endpoint
//!
//! Paginated ballot-level search across votes, members, and parties.
//! Result sets beyond the hard cap still return the requested page but
//! flag `too_large` so the caller narrows filters instead of walking
//! hundreds of thousands of rows.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rollcall_common::Choice;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;

use crate::api::filters::{majority_outcome, VoteFilters, BALLOT_JOINS};
use crate::pagination;
use crate::AppState;

/// Query parameters for vote search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub vote_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub country: Option<String>,
    pub group: Option<String>,
    pub party: Option<String>,
    pub mep_id: Option<String>,
    pub outcome: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl SearchParams {
    pub fn into_filters(self) -> (VoteFilters, Option<i64>, Option<i64>) {
        let filters = VoteFilters {
            q: self.q,
            vote_id: self.vote_id,
            date_from: self.date_from,
            date_to: self.date_to,
            country: self.country,
            group: self.group,
            party: self.party,
            mep_id: self.mep_id,
            outcome: self.outcome,
        };
        (filters, self.page, self.page_size)
    }
}

/// One ballot row in the search response
#[derive(Debug, Serialize)]
pub struct SearchItem {
    pub vote_id: String,
    pub date: String,
    pub title: String,
    pub mep_id: String,
    pub mep_name: String,
    pub group: Option<String>,
    pub country: Option<String>,
    pub party: Option<String>,
    pub outcome: String,
    pub majority_outcome: String,
    pub source_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchItem>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub export_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub too_large: Option<bool>,
}

/// GET /api/votes/search
pub async fn search_votes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, SearchError> {
    let (filters, page, page_size) = params.into_filters();
    let (where_sql, binds) = filters.where_clause();
    let pagination = pagination::clamp(page, page_size);

    let count_sql = format!("SELECT COUNT(*) {} {}", BALLOT_JOINS, where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total = count_query
        .fetch_one(&state.db)
        .await
        .map_err(|e| SearchError::DatabaseError(e.to_string()))?;

    let select_sql = format!(
        "SELECT v.ep_vote_id, v.date, v.title, v.source_url, \
                v.total_for, v.total_against, \
                m.ep_id, m.first_name, m.last_name, \
                p.abbreviation AS group_abbr, p.name AS party_name, \
                c.name AS country_name, b.choice \
         {} {} \
         ORDER BY v.date DESC, v.ep_vote_id, m.ep_id \
         LIMIT ? OFFSET ?",
        BALLOT_JOINS, where_sql
    );
    let mut select_query = sqlx::query(&select_sql);
    for bind in &binds {
        select_query = select_query.bind(bind);
    }
    let rows = select_query
        .bind(pagination.page_size)
        .bind(pagination.offset)
        .fetch_all(&state.db)
        .await
        .map_err(|e| SearchError::DatabaseError(e.to_string()))?;

    let items = rows
        .iter()
        .map(|row| {
            let first: String = row.get("first_name");
            let last: String = row.get("last_name");
            let choice: String = row.get("choice");
            SearchItem {
                vote_id: row.get("ep_vote_id"),
                date: row.get("date"),
                title: row.get("title"),
                mep_id: row.get("ep_id"),
                mep_name: display_name(&first, &last),
                group: row.get("group_abbr"),
                country: row.get("country_name"),
                party: row.get("party_name"),
                outcome: Choice::from_stored(&choice).display().to_string(),
                majority_outcome: majority_outcome(
                    row.get("total_for"),
                    row.get("total_against"),
                )
                .to_string(),
                source_url: row.get("source_url"),
            }
        })
        .collect();

    Ok(Json(SearchResponse {
        items,
        page: pagination.page,
        page_size: pagination.page_size,
        total,
        export_url: filters.export_url(),
        too_large: (total > state.search_cap).then_some(true),
    }))
}

pub fn display_name(first: &str, last: &str) -> String {
    if last.is_empty() {
        first.to_string()
    } else {
        format!("{} {}", first, last)
    }
}

#[derive(Debug)]
pub enum SearchError {
    DatabaseError(String),
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SearchError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
