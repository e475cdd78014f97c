//! Database operations for the importer (write side)

pub mod ballots;
pub mod countries;
pub mod members;
pub mod parties;
pub mod votes;
