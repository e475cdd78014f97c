//! Domain types shared by the importer and the query service

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A member's recorded choice on a roll-call vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    For,
    Against,
    Abstain,
    Absent,
}

impl Choice {
    /// Parse a source-file vote position, tolerating the synonym spellings
    /// the exports use. Unknown values are logged and treated as absent.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "for" | "yes" | "in favour" => Choice::For,
            "against" | "no" | "opposed" => Choice::Against,
            "abstain" | "abstention" | "abstained" => Choice::Abstain,
            "absent" | "not voting" | "did not vote" | "no vote" => Choice::Absent,
            other => {
                warn!("Unknown vote choice '{}', defaulting to absent", other);
                Choice::Absent
            }
        }
    }

    /// Canonical storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::For => "for",
            Choice::Against => "against",
            Choice::Abstain => "abstain",
            Choice::Absent => "absent",
        }
    }

    /// Storage form back to enum; unknown stored values count as absent.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "for" => Choice::For,
            "against" => Choice::Against,
            "abstain" => Choice::Abstain,
            _ => Choice::Absent,
        }
    }

    /// Display form used by the search API and CSV export
    pub fn display(&self) -> &'static str {
        match self {
            Choice::For => "For",
            Choice::Against => "Against",
            Choice::Abstain => "Abstain",
            Choice::Absent => "Absent",
        }
    }

    /// A cast ballot is any explicit position; absence is non-participation.
    pub fn counts_as_cast(&self) -> bool {
        !matches!(self, Choice::Absent)
    }
}

/// Normalized member identity record produced by the source loaders
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    /// Canonical external id; `None` means the record is unidentifiable
    pub ep_id: Option<String>,
    pub name: String,
    pub country: String,
    /// EU political group as written in the source
    pub eu_group: String,
    pub national_party: String,
    pub profile_url: Option<String>,
    pub photo_url: Option<String>,
}

/// Normalized attendance figures for one member
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceRecord {
    pub ep_id: String,
    pub votes_total: i64,
    pub votes_cast: i64,
    pub attendance_pct: f64,
    pub partial_term: bool,
}

/// Normalized vote-catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct VoteRecord {
    pub vote_id: String,
    /// ISO date string as it appeared in the source; validated at import
    pub date: String,
    pub title: String,
    pub result: Option<String>,
    pub source_url: Option<String>,
    pub total_for: i64,
    pub total_against: i64,
    pub total_abstain: i64,
}

/// One member's position on one vote, as loaded from a source file
#[derive(Debug, Clone, PartialEq)]
pub struct BallotRecord {
    pub ep_member_id: String,
    pub vote: VoteRecord,
    pub choice: Choice,
}

/// Attendance percentage from cast/total counts.
///
/// `None` when no votes were held in the window (never divides by zero);
/// otherwise `round(cast / total * 100)`, bounded in [0, 100].
pub fn attendance_pct(votes_cast: i64, votes_total: i64) -> Option<i64> {
    if votes_total <= 0 {
        return None;
    }
    let pct = (votes_cast as f64 / votes_total as f64 * 100.0).round() as i64;
    Some(pct.clamp(0, 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_synonyms() {
        assert_eq!(Choice::parse("For"), Choice::For);
        assert_eq!(Choice::parse("in favour"), Choice::For);
        assert_eq!(Choice::parse("Opposed"), Choice::Against);
        assert_eq!(Choice::parse("abstained"), Choice::Abstain);
        assert_eq!(Choice::parse("Not voting"), Choice::Absent);
        assert_eq!(Choice::parse("???"), Choice::Absent);
    }

    #[test]
    fn test_choice_roundtrip_storage() {
        for c in [Choice::For, Choice::Against, Choice::Abstain, Choice::Absent] {
            assert_eq!(Choice::from_stored(c.as_str()), c);
        }
    }

    #[test]
    fn test_absent_does_not_count_as_cast() {
        assert!(Choice::For.counts_as_cast());
        assert!(Choice::Abstain.counts_as_cast());
        assert!(!Choice::Absent.counts_as_cast());
    }

    #[test]
    fn test_attendance_pct() {
        assert_eq!(attendance_pct(1140, 1200), Some(95));
        assert_eq!(attendance_pct(0, 0), None);
        assert_eq!(attendance_pct(5, 0), None);
        assert_eq!(attendance_pct(0, 100), Some(0));
        assert_eq!(attendance_pct(100, 100), Some(100));
        // Rounding, not truncation
        assert_eq!(attendance_pct(2, 3), Some(67));
    }
}
