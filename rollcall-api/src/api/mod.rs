//! HTTP API handlers for rollcall-api

pub mod export;
pub mod filters;
pub mod health;
pub mod leaderboard;
pub mod search;

pub use export::export_votes_csv;
pub use health::health_routes;
pub use leaderboard::{leaderboard, leaderboard_bottom};
pub use search::search_votes;
