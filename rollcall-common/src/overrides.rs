//! Member override table: special roles and sick leave
//!
//! A small curated list of members whose attendance should be annotated
//! (presiding officers) or excluded from bottom rankings (sick leave).
//! Keyed by the stable external id rather than display name, so upstream
//! name reformatting cannot silently detach an override.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One override entry, keyed by the member's external id
#[derive(Debug, Clone, Deserialize)]
pub struct MemberOverride {
    pub ep_id: String,
    /// e.g. "President", "Vice-President"
    #[serde(default)]
    pub special_role: Option<String>,
    #[serde(default)]
    pub sick_leave: bool,
}

#[derive(Debug, Deserialize)]
struct OverrideFile {
    #[serde(default)]
    member: Vec<MemberOverride>,
}

/// Override table loaded from TOML, indexed by external id
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    by_ep_id: HashMap<String, MemberOverride>,
}

impl Overrides {
    /// Load from a TOML file of `[[member]]` entries. A missing file is not
    /// an error (no overrides apply); a malformed file is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: OverrideFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid override table: {}", e)))?;
        let by_ep_id = file
            .member
            .into_iter()
            .map(|m| (m.ep_id.clone(), m))
            .collect();
        Ok(Self { by_ep_id })
    }

    pub fn get(&self, ep_id: &str) -> Option<&MemberOverride> {
        self.by_ep_id.get(ep_id)
    }

    pub fn special_role(&self, ep_id: &str) -> Option<&str> {
        self.get(ep_id).and_then(|m| m.special_role.as_deref())
    }

    pub fn sick_leave(&self, ep_id: &str) -> bool {
        self.get(ep_id).map(|m| m.sick_leave).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.by_ep_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ep_id.is_empty()
    }
}
