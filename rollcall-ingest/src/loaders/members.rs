//! Member identity and attendance CSV loaders
//!
//! `meps.csv` carries identity (name, country, group, party, urls);
//! `meps_attendance.csv` carries the source-provided attendance figures.
//! The two merge on the normalized external id.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rollcall_common::identity::{member_id_from_profile_url, normalize_external_id};
use rollcall_common::types::{AttendanceRecord, MemberRecord};
use serde::Deserialize;
use tracing::warn;

use super::{coerce_count, coerce_number};

#[derive(Debug, Deserialize)]
struct RawMemberRow {
    #[serde(default)]
    mep_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    party: String,
    #[serde(default)]
    national_party: String,
    #[serde(default)]
    profile_url: String,
    #[serde(default)]
    photo_url: String,
}

#[derive(Debug, Deserialize)]
struct RawAttendanceRow {
    #[serde(default)]
    mep_id: String,
    #[serde(default)]
    votes_total_period: String,
    #[serde(default)]
    votes_cast: String,
    #[serde(default)]
    attendance_pct: String,
    #[serde(default)]
    partial_term: String,
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Load member identity records. A row whose external id cannot be
/// recovered from either the id column or the profile URL is kept with
/// `ep_id = None`; the importer decides how to count it.
pub fn load_members(path: &Path) -> Result<Vec<MemberRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<RawMemberRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: skipping malformed row {}: {}", path.display(), line + 2, e);
                continue;
            }
        };

        let ep_id = normalize_external_id(&row.mep_id)
            .or_else(|| member_id_from_profile_url(&row.profile_url));

        records.push(MemberRecord {
            ep_id,
            name: row.name.trim().to_string(),
            country: row.country.trim().to_string(),
            eu_group: row.party.trim().to_string(),
            national_party: row.national_party.trim().to_string(),
            profile_url: non_empty(row.profile_url),
            photo_url: non_empty(row.photo_url),
        });
    }
    Ok(records)
}

/// Load source-provided attendance figures keyed by external id
pub fn load_attendance(path: &Path) -> Result<Vec<AttendanceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<RawAttendanceRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: skipping malformed row {}: {}", path.display(), line + 2, e);
                continue;
            }
        };

        let ep_id = match normalize_external_id(&row.mep_id) {
            Some(id) => id,
            None => {
                warn!("{}: attendance row {} has no usable mep_id", path.display(), line + 2);
                continue;
            }
        };

        records.push(AttendanceRecord {
            ep_id,
            votes_total: coerce_count(&row.votes_total_period),
            votes_cast: coerce_count(&row.votes_cast),
            attendance_pct: coerce_number(&row.attendance_pct),
            partial_term: row.partial_term.eq_ignore_ascii_case("true"),
        });
    }
    Ok(records)
}

/// Merge identity and attendance by external id. A member without an
/// attendance row gets zeroed figures and a warning.
pub fn merge_attendance(
    members: Vec<MemberRecord>,
    attendance: Vec<AttendanceRecord>,
) -> Vec<(MemberRecord, AttendanceRecord)> {
    let by_id: HashMap<String, AttendanceRecord> = attendance
        .into_iter()
        .map(|a| (a.ep_id.clone(), a))
        .collect();

    members
        .into_iter()
        .map(|member| {
            let figures = member
                .ep_id
                .as_deref()
                .and_then(|id| by_id.get(id).cloned())
                .unwrap_or_else(|| {
                    if let Some(id) = &member.ep_id {
                        warn!("No attendance data for member {} ({})", id, member.name);
                    }
                    AttendanceRecord {
                        ep_id: member.ep_id.clone().unwrap_or_default(),
                        ..AttendanceRecord::default()
                    }
                });
            (member, figures)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_members_normalizes_float_noise_ids() {
        let f = write_temp(
            "mep_id,name,country,party,national_party,profile_url,photo_url\n\
             197400.0,Jane Doe,Sweden,Group of the European People's Party (Christian Democrats),Moderates,https://www.europarl.europa.eu/meps/en/197400,\n",
        );
        let records = load_members(f.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ep_id.as_deref(), Some("197400"));
        assert_eq!(records[0].name, "Jane Doe");
        assert!(records[0].photo_url.is_none());
    }

    #[test]
    fn test_load_members_falls_back_to_profile_url() {
        let f = write_temp(
            "mep_id,name,country,party,national_party,profile_url,photo_url\n\
             ,John Roe,Austria,Renew Europe Group,NEOS,https://www.europarl.europa.eu/meps/en/12345/JOHN_ROE,\n",
        );
        let records = load_members(f.path()).unwrap();
        assert_eq!(records[0].ep_id.as_deref(), Some("12345"));
    }

    #[test]
    fn test_load_attendance_coerces_malformed_numbers() {
        let f = write_temp(
            "mep_id,votes_total_period,votes_cast,attendance_pct,partial_term\n\
             197400.0,1200,1140,95.0,False\n\
             111,not-a-number,,,True\n",
        );
        let records = load_attendance(f.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ep_id, "197400");
        assert_eq!(records[0].votes_total, 1200);
        assert_eq!(records[0].votes_cast, 1140);
        assert_eq!(records[0].attendance_pct, 95.0);
        assert!(!records[0].partial_term);
        assert_eq!(records[1].votes_total, 0);
        assert_eq!(records[1].votes_cast, 0);
        assert!(records[1].partial_term);
    }

    #[test]
    fn test_merge_defaults_missing_attendance_to_zero() {
        let members = vec![MemberRecord {
            ep_id: Some("1".into()),
            name: "A".into(),
            country: "Sweden".into(),
            eu_group: "g".into(),
            national_party: "p".into(),
            profile_url: None,
            photo_url: None,
        }];
        let merged = merge_attendance(members, vec![]);
        assert_eq!(merged[0].1.votes_total, 0);
        assert!(!merged[0].1.partial_term);
    }
}
