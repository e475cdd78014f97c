//! Shared ballot filter set for search and export
//!
//! Both endpoints accept the same filters and must agree on what they
//! match, so the WHERE clause is built in one place. All filters AND
//! together; an empty set matches every ballot.

use rollcall_common::identity::normalize_external_id;
use rollcall_common::reference::eu_group_abbreviation;
use rollcall_common::Choice;
use serde::{Deserialize, Serialize};

/// Joins underlying every ballot-level query. Member attributes come
/// along for free so filters and output columns never need a second pass.
pub const BALLOT_JOINS: &str = "\
    FROM ballots b \
    JOIN members m ON b.member_id = m.id \
    JOIN votes v ON b.vote_id = v.id \
    LEFT JOIN parties p ON m.party_id = p.id \
    LEFT JOIN countries c ON m.country_id = c.id";

/// Filter parameters shared by search and export
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VoteFilters {
    /// Title substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// External vote id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_id: Option<String>,
    /// Inclusive ISO date bounds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    /// ISO-2 country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// EU group name or abbreviation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// National party name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    /// External member id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mep_id: Option<String>,
    /// Ballot choice (synonyms accepted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl VoteFilters {
    /// Build the WHERE clause and its bind values, in order.
    pub fn where_clause(&self) -> (String, Vec<String>) {
        let mut conds: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(q) = non_empty(&self.q) {
            conds.push("v.title LIKE ?");
            binds.push(format!("%{}%", q));
        }
        if let Some(vote_id) = non_empty(&self.vote_id) {
            conds.push("v.ep_vote_id = ?");
            binds.push(vote_id.to_string());
        }
        if let Some(from) = non_empty(&self.date_from) {
            conds.push("v.date >= ?");
            binds.push(from.to_string());
        }
        if let Some(to) = non_empty(&self.date_to) {
            conds.push("v.date <= ?");
            binds.push(to.to_string());
        }
        if let Some(country) = non_empty(&self.country) {
            conds.push("c.code = ?");
            binds.push(country.to_uppercase());
        }
        if let Some(group) = non_empty(&self.group) {
            conds.push("p.abbreviation = ?");
            binds.push(eu_group_abbreviation(group));
        }
        if let Some(party) = non_empty(&self.party) {
            conds.push("p.name = ?");
            binds.push(party.to_string());
        }
        if let Some(mep_id) = non_empty(&self.mep_id) {
            conds.push("m.ep_id = ?");
            binds.push(normalize_external_id(mep_id).unwrap_or_else(|| mep_id.to_string()));
        }
        if let Some(outcome) = non_empty(&self.outcome) {
            conds.push("b.choice = ?");
            binds.push(Choice::parse(outcome).as_str().to_string());
        }

        if conds.is_empty() {
            (String::new(), binds)
        } else {
            (format!("WHERE {}", conds.join(" AND ")), binds)
        }
    }

    /// Query string for the companion export endpoint
    pub fn export_url(&self) -> String {
        match serde_urlencoded::to_string(self) {
            Ok(qs) if !qs.is_empty() => format!("/api/votes/export.csv?{}", qs),
            _ => "/api/votes/export.csv".to_string(),
        }
    }
}

fn non_empty(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Majority outcome of a vote from its recorded totals. Display-only,
/// never stored.
pub fn majority_outcome(total_for: i64, total_against: i64) -> &'static str {
    use std::cmp::Ordering;
    match total_for.cmp(&total_against) {
        Ordering::Greater => "for",
        Ordering::Less => "against",
        Ordering::Equal => "tie",
    }
}
