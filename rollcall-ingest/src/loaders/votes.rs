//! Vote catalog CSV loader

use std::path::Path;

use anyhow::{Context, Result};
use rollcall_common::types::VoteRecord;
use serde::Deserialize;
use tracing::warn;

use super::coerce_count;

#[derive(Debug, Deserialize)]
struct RawVoteRow {
    #[serde(default)]
    vote_id: String,
    #[serde(default)]
    vote_date: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    result: String,
    #[serde(default)]
    total_for: String,
    #[serde(default)]
    total_against: String,
    #[serde(default)]
    total_abstain: String,
    #[serde(default)]
    source_url: String,
}

/// Load the vote catalog. Rows without an external vote id are skipped.
pub fn load_catalog(path: &Path) -> Result<Vec<VoteRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<RawVoteRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: skipping malformed row {}: {}", path.display(), line + 2, e);
                continue;
            }
        };

        let vote_id = row.vote_id.trim();
        if vote_id.is_empty() {
            warn!("{}: catalog row {} has no vote_id", path.display(), line + 2);
            continue;
        }

        records.push(VoteRecord {
            vote_id: vote_id.to_string(),
            date: row.vote_date.trim().to_string(),
            title: row.title.trim().to_string(),
            result: opt(row.result),
            source_url: opt(row.source_url),
            total_for: coerce_count(&row.total_for),
            total_against: coerce_count(&row.total_against),
            total_abstain: coerce_count(&row.total_abstain),
        });
    }
    Ok(records)
}

fn opt(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_catalog() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(
            b"vote_id,vote_date,title,result,olp_stage,total_for,total_against,total_abstain,source_url\n\
              170123,2024-04-24,\"Nature restoration, first reading\",Adopted,First reading,329,275,24,https://example.org/v/170123\n\
              ,2024-04-24,no id here,,,1,2,3,\n",
        )
        .unwrap();

        let records = load_catalog(f.path()).unwrap();
        assert_eq!(records.len(), 1);
        let v = &records[0];
        assert_eq!(v.vote_id, "170123");
        assert_eq!(v.date, "2024-04-24");
        assert_eq!(v.title, "Nature restoration, first reading");
        assert_eq!(v.result.as_deref(), Some("Adopted"));
        assert_eq!(v.total_for, 329);
        assert_eq!(v.total_against, 275);
        assert_eq!(v.total_abstain, 24);
    }
}
