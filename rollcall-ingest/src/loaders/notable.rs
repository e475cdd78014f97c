//! Per-member ballot loaders
//!
//! Three shapes of the same data: a flat CSV (`mep_notable_votes.csv`),
//! a JSON bundle keyed by external member id, and the gzip-compressed
//! bulk archive of the bundle. All decode to [`BallotRecord`]s carrying
//! the vote metadata inline, so the importer can create votes it has
//! never seen before.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use rollcall_common::identity::normalize_external_id;
use rollcall_common::types::{BallotRecord, VoteRecord};
use rollcall_common::Choice;
use serde::Deserialize;
use tracing::warn;

use super::{coerce_count, coerce_json_count};

#[derive(Debug, Deserialize)]
struct RawNotableRow {
    #[serde(default)]
    mep_id: String,
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
    #[serde(default)]
    vote_position: String,
}

/// One position entry in the JSON bundle. Numeric totals arrive as
/// numbers or strings depending on which exporter produced the file.
#[derive(Debug, Deserialize)]
struct JsonPosition {
    #[serde(default)]
    vote_id: String,
    #[serde(default)]
    vote_date: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    result: String,
    #[serde(default)]
    total_for: serde_json::Value,
    #[serde(default)]
    total_against: serde_json::Value,
    #[serde(default)]
    total_abstain: serde_json::Value,
    #[serde(default)]
    source_url: String,
    #[serde(default)]
    vote_position: String,
}

fn opt(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Load the flat per-member ballot CSV
pub fn load_csv(path: &Path) -> Result<Vec<BallotRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<RawNotableRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: skipping malformed row {}: {}", path.display(), line + 2, e);
                continue;
            }
        };

        let mep_id = match normalize_external_id(&row.mep_id) {
            Some(id) => id,
            None => {
                warn!("{}: ballot row {} has no usable mep_id", path.display(), line + 2);
                continue;
            }
        };
        let vote_id = row.vote_id.trim();
        if vote_id.is_empty() {
            warn!("{}: ballot row {} has no vote_id", path.display(), line + 2);
            continue;
        }

        records.push(BallotRecord {
            ep_member_id: mep_id,
            vote: VoteRecord {
                vote_id: vote_id.to_string(),
                date: row.vote_date.trim().to_string(),
                title: row.title.trim().to_string(),
                result: opt(&row.result),
                source_url: opt(&row.source_url),
                total_for: coerce_count(&row.total_for),
                total_against: coerce_count(&row.total_against),
                total_abstain: coerce_count(&row.total_abstain),
            },
            choice: Choice::parse(&row.vote_position),
        });
    }
    Ok(records)
}

/// Load the JSON bundle (map of external member id to position list)
pub fn load_json(path: &Path) -> Result<Vec<BallotRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    decode_bundle(BufReader::new(file), path)
}

/// Load the gzip-compressed bulk archive of the JSON bundle. Decompression
/// streams through the decoder; the archive is never held in memory whole.
pub fn load_json_gz(path: &Path) -> Result<Vec<BallotRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    decode_bundle(BufReader::new(GzDecoder::new(file)), path)
}

fn decode_bundle<R: std::io::Read>(reader: R, path: &Path) -> Result<Vec<BallotRecord>> {
    // BTreeMap keeps member order deterministic across runs
    let bundle: BTreeMap<String, Vec<JsonPosition>> = serde_json::from_reader(reader)
        .with_context(|| format!("decoding {}", path.display()))?;

    let mut records = Vec::new();
    for (raw_mep_id, positions) in bundle {
        let mep_id = match normalize_external_id(&raw_mep_id) {
            Some(id) => id,
            None => {
                warn!("{}: bundle key '{}' is not a usable mep_id", path.display(), raw_mep_id);
                continue;
            }
        };

        for position in positions {
            let vote_id = position.vote_id.trim();
            if vote_id.is_empty() {
                warn!("{}: position without vote_id for member {}", path.display(), mep_id);
                continue;
            }
            records.push(BallotRecord {
                ep_member_id: mep_id.clone(),
                vote: VoteRecord {
                    vote_id: vote_id.to_string(),
                    date: position.vote_date.trim().to_string(),
                    title: position.title.trim().to_string(),
                    result: opt(&position.result),
                    source_url: opt(&position.source_url),
                    total_for: coerce_json_count(&position.total_for),
                    total_against: coerce_json_count(&position.total_against),
                    total_abstain: coerce_json_count(&position.total_abstain),
                },
                choice: Choice::parse(&position.vote_position),
            });
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUNDLE: &str = r#"{
        "197400.0": [
            {"vote_id": "170123", "vote_date": "2024-04-24", "title": "Nature restoration",
             "result": "Adopted", "total_for": 329, "total_against": "275", "total_abstain": 24,
             "source_url": "https://example.org/v/170123", "vote_position": "for"},
            {"vote_id": "170124", "vote_date": "2024-04-25", "title": "Budget discharge",
             "vote_position": "did not vote"}
        ],
        "nan": [
            {"vote_id": "170123", "vote_position": "against"}
        ]
    }"#;

    #[test]
    fn test_load_csv_parses_positions() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(
            b"mep_id,vote_id,vote_date,title,result,olp_stage,total_for,total_against,total_abstain,source_url,vote_position\n\
              197400.0,170123,2024-04-24,Nature restoration,Adopted,,329,275,24,,Abstention\n",
        )
        .unwrap();

        let records = load_csv(f.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ep_member_id, "197400");
        assert_eq!(records[0].choice, Choice::Abstain);
        assert_eq!(records[0].vote.total_against, 275);
    }

    #[test]
    fn test_load_json_normalizes_keys_and_skips_unusable() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(BUNDLE.as_bytes()).unwrap();

        let records = load_json(f.path()).unwrap();
        // The "nan" key is unusable; both positions of 197400 survive
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.ep_member_id == "197400"));
        assert_eq!(records[0].choice, Choice::For);
        assert_eq!(records[0].vote.total_against, 275);
        assert_eq!(records[1].choice, Choice::Absent);
    }

    #[test]
    fn test_load_json_gz_roundtrip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut f = tempfile::NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BUNDLE.as_bytes()).unwrap();
        f.write_all(&encoder.finish().unwrap()).unwrap();

        let records = load_json_gz(f.path()).unwrap();
        assert_eq!(records.len(), 2);
    }
}
