//! Database schema and initialization

mod init;

pub use init::{create_schema, init_database, memory_pool};
