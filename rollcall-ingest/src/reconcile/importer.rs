//! Phased import: members, then unique votes, then ballots
//!
//! Votes are resolved before ballots so ballot creation never blocks on
//! an unknown vote id. Writes happen in bounded batches so one run over
//! a bulk archive keeps transaction sizes predictable.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use rollcall_common::identity::{slugify, split_name};
use rollcall_common::overrides::Overrides;
use rollcall_common::reference::{country_code, country_display_name};
use rollcall_common::types::{attendance_pct, AttendanceRecord, BallotRecord, MemberRecord, VoteRecord};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{ballots, countries, members, parties, votes};
use crate::loaders;

use super::{ImportCaches, ImportReport};

const VOTE_BATCH_SIZE: usize = 50;
const BALLOT_BATCH_SIZE: usize = 200;

/// Input files for one import run. All optional individually; a run with
/// no inputs at all is an error.
#[derive(Debug, Default, Clone)]
pub struct ImportInputs {
    pub members: Option<PathBuf>,
    pub attendance: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub notable_csv: Option<PathBuf>,
    /// JSON bundles, gzip-compressed when the extension is `.gz`
    pub bundles: Vec<PathBuf>,
}

impl ImportInputs {
    pub fn is_empty(&self) -> bool {
        self.members.is_none()
            && self.attendance.is_none()
            && self.catalog.is_none()
            && self.notable_csv.is_none()
            && self.bundles.is_empty()
    }
}

/// Run one idempotent import over the given inputs.
pub async fn run_import(
    pool: &SqlitePool,
    overrides: &Overrides,
    inputs: &ImportInputs,
) -> Result<ImportReport> {
    if inputs.is_empty() {
        bail!("no input files given, nothing to import");
    }

    let mut caches = ImportCaches::new();
    let mut report = ImportReport::default();

    if let Some(path) = &inputs.members {
        let identity = loaders::members::load_members(path)?;
        info!("Loaded {} member records from {}", identity.len(), path.display());

        let figures = match &inputs.attendance {
            Some(att_path) => {
                let figures = loaders::members::load_attendance(att_path)?;
                info!("Loaded {} attendance records from {}", figures.len(), att_path.display());
                figures
            }
            None => Vec::new(),
        };

        let merged = loaders::members::merge_attendance(identity, figures);
        import_members(pool, overrides, merged, &mut caches, &mut report).await?;
    }

    let mut ballot_records: Vec<BallotRecord> = Vec::new();
    if let Some(path) = &inputs.notable_csv {
        let loaded = loaders::notable::load_csv(path)?;
        info!("Loaded {} ballot records from {}", loaded.len(), path.display());
        ballot_records.extend(loaded);
    }
    for path in &inputs.bundles {
        let loaded = if path.extension().map(|e| e == "gz").unwrap_or(false) {
            loaders::notable::load_json_gz(path)?
        } else {
            loaders::notable::load_json(path)?
        };
        info!("Loaded {} ballot records from {}", loaded.len(), path.display());
        ballot_records.extend(loaded);
    }

    // Unique votes across every source, first occurrence wins
    let mut unique_votes: BTreeMap<String, VoteRecord> = BTreeMap::new();
    if let Some(path) = &inputs.catalog {
        let catalog = loaders::votes::load_catalog(path)?;
        info!("Loaded {} votes from {}", catalog.len(), path.display());
        for vote in catalog {
            unique_votes.entry(vote.vote_id.clone()).or_insert(vote);
        }
    }
    for ballot in &ballot_records {
        unique_votes
            .entry(ballot.vote.vote_id.clone())
            .or_insert_with(|| ballot.vote.clone());
    }

    import_votes(pool, unique_votes, &mut caches, &mut report).await?;
    import_ballots(pool, ballot_records, &mut caches, &mut report).await?;

    report.log_summary();
    Ok(report)
}

async fn import_members(
    pool: &SqlitePool,
    overrides: &Overrides,
    merged: Vec<(MemberRecord, AttendanceRecord)>,
    caches: &mut ImportCaches,
    report: &mut ImportReport,
) -> Result<()> {
    info!("Importing {} members", merged.len());

    for (record, figures) in merged {
        let ep_id = match &record.ep_id {
            Some(id) => id.clone(),
            None => {
                warn!("Unidentifiable member record '{}', skipping", record.name);
                report.members.errored += 1;
                continue;
            }
        };

        match import_one_member(pool, overrides, &ep_id, &record, &figures, caches, report).await {
            Ok(created) => {
                if created {
                    report.members.created += 1;
                } else {
                    report.members.skipped += 1;
                }
            }
            Err(e) => {
                warn!("Failed to import member {}: {}", ep_id, e);
                report.members.errored += 1;
            }
        }
    }
    Ok(())
}

async fn import_one_member(
    pool: &SqlitePool,
    overrides: &Overrides,
    ep_id: &str,
    record: &MemberRecord,
    figures: &AttendanceRecord,
    caches: &mut ImportCaches,
    report: &mut ImportReport,
) -> Result<bool> {
    let country_id = resolve_country(pool, &record.country, caches).await?;
    let party_id = resolve_party(pool, record, country_id, caches).await?;

    let slug = slugify(&record.name);
    if let Some(owner) = caches.slugs.get(&slug) {
        if owner != ep_id {
            warn!("Slug collision: '{}' claimed by both {} and {}", slug, owner, ep_id);
            report.slug_collisions += 1;
        }
    } else {
        if let Some(owner) = members::slug_owner(pool, &slug).await? {
            if owner != ep_id {
                warn!("Slug collision: '{}' claimed by both {} and {}", slug, owner, ep_id);
                report.slug_collisions += 1;
            }
        }
        caches.slugs.insert(slug.clone(), ep_id.to_string());
    }

    let (first_name, last_name) = split_name(&record.name);
    let member = members::Member {
        id: Uuid::new_v4(),
        ep_id: ep_id.to_string(),
        first_name,
        last_name,
        slug,
        country_id,
        party_id,
        profile_url: record.profile_url.clone(),
        photo_url: record.photo_url.clone(),
        attendance_pct: attendance_pct(figures.votes_cast, figures.votes_total),
        votes_cast: figures.votes_cast,
        votes_total: figures.votes_total,
        partial_term: figures.partial_term,
        special_role: overrides.special_role(ep_id).map(String::from),
        sick_leave: overrides.sick_leave(ep_id),
    };

    let (internal_id, created) = members::upsert(pool, &member).await?;
    caches.members.insert(ep_id.to_string(), internal_id);
    Ok(created)
}

async fn resolve_country(
    pool: &SqlitePool,
    raw_country: &str,
    caches: &mut ImportCaches,
) -> Result<Option<Uuid>> {
    let name = country_display_name(raw_country.trim());
    if name.is_empty() {
        return Ok(None);
    }
    let code = country_code(name);
    if let Some(id) = caches.countries.get(&code) {
        return Ok(Some(*id));
    }
    let country = countries::Country::new(code.clone(), name.to_string());
    let id = countries::create(pool, &country).await?;
    caches.countries.insert(code, id);
    Ok(Some(id))
}

async fn resolve_party(
    pool: &SqlitePool,
    record: &MemberRecord,
    country_id: Option<Uuid>,
    caches: &mut ImportCaches,
) -> Result<Option<Uuid>> {
    if record.eu_group.is_empty() && record.national_party.is_empty() {
        return Ok(None);
    }
    let party = parties::Party::new(
        record.eu_group.clone(),
        record.national_party.clone(),
        country_id,
    );
    let key = (party.eu_group.clone(), party.name.clone());
    if let Some(id) = caches.parties.get(&key) {
        return Ok(Some(*id));
    }
    let id = parties::create(pool, &party).await?;
    caches.parties.insert(key, id);
    Ok(Some(id))
}

/// Accepts plain ISO dates and datetime strings with an ISO date prefix.
fn parse_vote_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    None
}

async fn import_votes(
    pool: &SqlitePool,
    unique_votes: BTreeMap<String, VoteRecord>,
    caches: &mut ImportCaches,
    report: &mut ImportReport,
) -> Result<()> {
    if unique_votes.is_empty() {
        return Ok(());
    }
    info!("Importing {} unique votes", unique_votes.len());

    let entries: Vec<(String, VoteRecord)> = unique_votes.into_iter().collect();
    let mut date_min: Option<String> = None;
    let mut date_max: Option<String> = None;

    for batch in entries.chunks(VOTE_BATCH_SIZE) {
        // Inserts share a transaction; conflicted ids resolve afterwards
        let mut tx = pool.begin().await?;
        let mut pending: Vec<(String, Option<Uuid>)> = Vec::with_capacity(batch.len());

        for (ep_vote_id, record) in batch {
            let date = match parse_vote_date(&record.date) {
                Some(date) => date,
                None => {
                    warn!("Vote {} has unparseable date '{}', skipping", ep_vote_id, record.date);
                    report.votes.errored += 1;
                    continue;
                }
            };

            let vote = votes::Vote {
                id: Uuid::new_v4(),
                ep_vote_id: ep_vote_id.clone(),
                date,
                title: record.title.clone(),
                description: record.result.clone(),
                source_url: record.source_url.clone(),
                total_for: record.total_for,
                total_against: record.total_against,
                total_abstain: record.total_abstain,
            };

            match votes::insert_ignore(&mut *tx, &vote).await {
                Ok(true) => {
                    report.votes.created += 1;
                    pending.push((ep_vote_id.clone(), Some(vote.id)));
                }
                Ok(false) => {
                    report.votes.skipped += 1;
                    pending.push((ep_vote_id.clone(), None));
                }
                Err(e) => {
                    warn!("Failed to import vote {}: {}", ep_vote_id, e);
                    report.votes.errored += 1;
                    continue;
                }
            }

            let iso = date.format("%Y-%m-%d").to_string();
            if date_min.as_deref().map(|d| iso.as_str() < d).unwrap_or(true) {
                date_min = Some(iso.clone());
            }
            if date_max.as_deref().map(|d| iso.as_str() > d).unwrap_or(true) {
                date_max = Some(iso);
            }
        }
        tx.commit().await?;

        for (ep_vote_id, created_id) in pending {
            let internal = match created_id {
                Some(id) => Some(id),
                None => votes::find_by_ep_vote_id(pool, &ep_vote_id).await?,
            };
            if let Some(id) = internal {
                caches.votes.insert(ep_vote_id, id);
            }
        }
    }

    if let (Some(min), Some(max)) = (date_min, date_max) {
        report.date_range = Some((min, max));
    }
    Ok(())
}

async fn import_ballots(
    pool: &SqlitePool,
    records: Vec<BallotRecord>,
    caches: &mut ImportCaches,
    report: &mut ImportReport,
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    info!("Importing {} ballots", records.len());

    for batch in records.chunks(BALLOT_BATCH_SIZE) {
        // Resolve ids outside the transaction so lookups never hold it open
        let mut resolved: Vec<(Uuid, Uuid, rollcall_common::Choice)> =
            Vec::with_capacity(batch.len());

        for record in batch {
            let member_id = match resolve_member_id(pool, &record.ep_member_id, caches).await? {
                Some(id) => id,
                None => {
                    report.unmatched_ballots += 1;
                    continue;
                }
            };
            let vote_id = match caches.votes.get(&record.vote.vote_id) {
                Some(id) => *id,
                None => {
                    report.unmatched_ballots += 1;
                    continue;
                }
            };
            resolved.push((member_id, vote_id, record.choice));
        }

        let mut tx = pool.begin().await?;
        for (member_id, vote_id, choice) in resolved {
            match ballots::insert_first_wins(&mut *tx, member_id, vote_id, choice).await {
                Ok(true) => report.ballots.created += 1,
                Ok(false) => report.ballots.skipped += 1,
                Err(e) => {
                    warn!("Failed to insert ballot {}/{}: {}", member_id, vote_id, e);
                    report.ballots.errored += 1;
                }
            }
        }
        tx.commit().await?;

        let done = report.ballots.processed() + report.unmatched_ballots;
        if done % 10_000 < BALLOT_BATCH_SIZE as u64 {
            info!("Ballot progress: {} processed", done);
        }
    }
    Ok(())
}

async fn resolve_member_id(
    pool: &SqlitePool,
    ep_id: &str,
    caches: &mut ImportCaches,
) -> Result<Option<Uuid>> {
    if let Some(id) = caches.members.get(ep_id) {
        return Ok(Some(*id));
    }
    match members::find_by_ep_id(pool, ep_id).await? {
        Some(id) => {
            caches.members.insert(ep_id.to_string(), id);
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vote_date() {
        assert_eq!(
            parse_vote_date("2024-04-24"),
            NaiveDate::from_ymd_opt(2024, 4, 24)
        );
        assert_eq!(
            parse_vote_date("2024-04-24T12:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 4, 24)
        );
        assert_eq!(parse_vote_date("24/04/2024"), None);
        assert_eq!(parse_vote_date(""), None);
    }

    #[test]
    fn test_empty_inputs_detected() {
        assert!(ImportInputs::default().is_empty());
        let inputs = ImportInputs {
            catalog: Some(PathBuf::from("votes.csv")),
            ..Default::default()
        };
        assert!(!inputs.is_empty());
    }
}
