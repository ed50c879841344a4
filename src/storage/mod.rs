mod error;
mod sqlite;
mod store;

pub use error::*;
pub use sqlite::*;
pub use store::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
