//! CSV export endpoint
//!
//! Streams the filtered ballot set row by row; the full result is never
//! materialized in memory. Counts first and refuses outright when the
//! set exceeds the export cap.

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::StreamExt;
use rollcall_common::Choice;
use serde_json::json;
use sqlx::Row;

use crate::api::filters::{majority_outcome, VoteFilters, BALLOT_JOINS};
use crate::api::search::{display_name, SearchParams};
use crate::AppState;

const CSV_HEADER: &str =
    "vote_id,date,title,mep_id,mep_name,group,country,party,outcome,majority_outcome,source_url\n";

/// GET /api/votes/export.csv
pub async fn export_votes_csv(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ExportError> {
    let (filters, _, _) = params.into_filters();
    let (where_sql, binds) = filters.where_clause();

    let count_sql = format!("SELECT COUNT(*) {} {}", BALLOT_JOINS, where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total = count_query
        .fetch_one(&state.db)
        .await
        .map_err(|e| ExportError::DatabaseError(e.to_string()))?;

    if total > state.export_cap {
        return Err(ExportError::TooLarge {
            total,
            cap: state.export_cap,
        });
    }

    let select_sql = format!(
        "SELECT v.ep_vote_id, v.date, v.title, v.source_url, \
                v.total_for, v.total_against, \
                m.ep_id, m.first_name, m.last_name, \
                p.abbreviation AS group_abbr, p.name AS party_name, \
                c.name AS country_name, b.choice \
         {} {} \
         ORDER BY v.date DESC, v.ep_vote_id, m.ep_id",
        BALLOT_JOINS, where_sql
    );

    let db = state.db.clone();
    let stream = async_stream::stream! {
        yield Ok::<Bytes, sqlx::Error>(Bytes::from_static(CSV_HEADER.as_bytes()));

        let mut query = sqlx::query(&select_sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let mut rows = query.fetch(&db);
        while let Some(row) = rows.next().await {
            match row {
                Ok(row) => yield Ok(Bytes::from(csv_row(&row))),
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    };

    let filename = format!("vote_export_{}.csv", Utc::now().format("%Y-%m-%d"));
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ExportError::DatabaseError(e.to_string()))?;
    Ok(response)
}

fn csv_row(row: &sqlx::sqlite::SqliteRow) -> String {
    let first: String = row.get("first_name");
    let last: String = row.get("last_name");
    let choice: String = row.get("choice");
    let fields = [
        row.get::<String, _>("ep_vote_id"),
        row.get::<String, _>("date"),
        row.get::<String, _>("title"),
        row.get::<String, _>("ep_id"),
        display_name(&first, &last),
        row.get::<Option<String>, _>("group_abbr").unwrap_or_default(),
        row.get::<Option<String>, _>("country_name").unwrap_or_default(),
        row.get::<Option<String>, _>("party_name").unwrap_or_default(),
        Choice::from_stored(&choice).display().to_string(),
        majority_outcome(row.get("total_for"), row.get("total_against")).to_string(),
        row.get::<Option<String>, _>("source_url").unwrap_or_default(),
    ];
    let mut line = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Standard CSV quoting: wrap when the field carries a comma, quote, or
/// newline; embedded quotes double.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Debug)]
pub enum ExportError {
    TooLarge { total: i64, cap: i64 },
    DatabaseError(String),
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ExportError::TooLarge { total, cap } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Export of {} rows exceeds the {} row limit; narrow your filters",
                    total, cap
                ),
            ),
            ExportError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
