//! rollcall-api library - read-only query service
//!
//! Serves vote search, CSV export, and attendance leaderboards over the
//! rollcall database. All connections are read-only; the importer is the
//! only writer.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod pagination;

/// Search result sets larger than this are flagged rather than walked
pub const DEFAULT_SEARCH_RESULT_CAP: i64 = 50_000;

/// Exports larger than this many rows are refused outright
pub const DEFAULT_EXPORT_ROW_CAP: i64 = 100_000;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
    /// Row count above which search flags `too_large`
    pub search_cap: i64,
    /// Row count above which CSV export refuses
    pub export_cap: i64,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self::with_caps(db, DEFAULT_SEARCH_RESULT_CAP, DEFAULT_EXPORT_ROW_CAP)
    }

    pub fn with_caps(db: SqlitePool, search_cap: i64, export_cap: i64) -> Self {
        Self {
            db,
            search_cap,
            export_cap,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/votes/search", get(api::search_votes))
        .route("/api/votes/export.csv", get(api::export_votes_csv))
        .route("/api/leaderboard", get(api::leaderboard))
        .route("/api/leaderboard/bottom", get(api::leaderboard_bottom))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
