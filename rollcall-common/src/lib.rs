//! # Rollcall Common Library
//!
//! Shared code for the rollcall services:
//! - Database schema and initialization
//! - Domain types (vote choices, normalized source records)
//! - Identity normalization (external ids, profile URLs, slugs)
//! - Reference tables (country codes, EU group abbreviations)
//! - Member override tables (special roles, sick leave)
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod overrides;
pub mod reference;
pub mod types;

pub use error::{Error, Result};
pub use types::Choice;
