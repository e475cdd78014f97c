//! rollcall-ingest library - data reconciliation and import
//!
//! Loads raw parliament exports (CSV catalogs, nested JSON bundles,
//! compressed bulk archives), reconciles external member/vote identifiers
//! onto stable internal ids, and writes deduplicated ballots into the
//! rollcall database. Imports are idempotent: re-running over the same
//! inputs changes nothing.

pub mod attendance;
pub mod db;
pub mod loaders;
pub mod reconcile;
