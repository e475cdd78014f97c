//! Attendance backfill from stored ballots
//!
//! Recomputes each member's attendance over the most recent 180 days of
//! votes: `votes_total` counts the member's ballots in the window,
//! `votes_cast` those with an explicit position, and the percentage is
//! rounded cast/total. Members with no ballots in the window get zeroed
//! counts and a null percentage. Safe to re-run at any time.

use anyhow::Result;
use chrono::Duration;
use rollcall_common::types::attendance_pct;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{ballots, members, votes};

/// Days of vote history counted toward attendance
pub const ATTENDANCE_WINDOW_DAYS: i64 = 180;

/// Summary of one backfill pass
#[derive(Debug, Default, Clone, Copy)]
pub struct BackfillReport {
    pub members_updated: u64,
    pub members_without_ballots: u64,
}

/// Recompute attendance for every member from stored ballots.
///
/// Returns without writing when the store holds no votes at all.
pub async fn backfill(pool: &SqlitePool) -> Result<BackfillReport> {
    let newest = match votes::newest_date(pool).await? {
        Some(date) => date,
        None => {
            info!("No votes in store, nothing to backfill");
            return Ok(BackfillReport::default());
        }
    };
    let oldest = newest - Duration::days(ATTENDANCE_WINDOW_DAYS);
    let from = oldest.format("%Y-%m-%d").to_string();
    let to = newest.format("%Y-%m-%d").to_string();
    info!("Backfilling attendance over window {} to {}", from, to);

    let mut report = BackfillReport::default();
    for (member_id, ep_id) in members::list_ids(pool).await? {
        let (total, cast) = ballots::window_counts(pool, member_id, &from, &to).await?;
        let pct = attendance_pct(cast, total);
        members::update_attendance(pool, member_id, cast, total, pct).await?;

        if total == 0 {
            report.members_without_ballots += 1;
        }
        report.members_updated += 1;
        tracing::debug!("{}: {}/{} in window, pct {:?}", ep_id, cast, total, pct);
    }

    info!(
        "Backfill complete: {} members updated, {} with no ballots in window",
        report.members_updated, report.members_without_ballots
    );
    Ok(report)
}
