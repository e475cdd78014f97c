//! Reconciliation of external identifiers onto internal rows
//!
//! The importer merges loaded records into the store idempotently:
//! members upsert on external id, votes are created exactly once per
//! external vote id, and ballots are first-write-wins on the
//! (member, vote) pair. Re-running over the same inputs is a no-op.

mod importer;

pub use importer::{run_import, ImportInputs};

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

/// Run-scoped external-to-internal id caches.
///
/// Passed explicitly through the import phases; a fresh set per run.
/// The persistent unique constraints remain the source of truth, the
/// caches only spare repeated lookups within one run.
#[derive(Debug, Default)]
pub struct ImportCaches {
    /// ISO-2 country code to internal id
    pub countries: HashMap<String, Uuid>,
    /// (eu_group, national party name) to internal id
    pub parties: HashMap<(String, String), Uuid>,
    /// external member id to internal id
    pub members: HashMap<String, Uuid>,
    /// external vote id to internal id
    pub votes: HashMap<String, Uuid>,
    /// slug to the external id that first claimed it
    pub slugs: HashMap<String, String>,
}

impl ImportCaches {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome counters for one entity type
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounts {
    pub created: u64,
    pub skipped: u64,
    pub errored: u64,
}

impl EntityCounts {
    pub fn processed(&self) -> u64 {
        self.created + self.skipped + self.errored
    }
}

/// What one import run did, per entity type
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    pub members: EntityCounts,
    pub votes: EntityCounts,
    pub ballots: EntityCounts,
    /// Ballots whose member or vote could not be resolved
    pub unmatched_ballots: u64,
    /// Distinct slugs claimed by more than one external id
    pub slug_collisions: u64,
    /// Date range of votes seen this run, when any were
    pub date_range: Option<(String, String)>,
}

impl ImportReport {
    pub fn log_summary(&self) {
        info!(
            "Members: {} created, {} skipped, {} errored",
            self.members.created, self.members.skipped, self.members.errored
        );
        info!(
            "Votes: {} created, {} skipped, {} errored",
            self.votes.created, self.votes.skipped, self.votes.errored
        );
        info!(
            "Ballots: {} created, {} skipped, {} errored, {} unmatched",
            self.ballots.created, self.ballots.skipped, self.ballots.errored, self.unmatched_ballots
        );
        if self.slug_collisions > 0 {
            info!("Slug collisions: {}", self.slug_collisions);
        }
        if let Some((from, to)) = &self.date_range {
            info!("Vote dates: {} to {}", from, to);
        }
    }
}
