//! SQLite cache database for derived media metadata.
//!
//! Deriving a thumbnail or a duration means shelling out to external tools,
//! which is slow. This crate remembers the result per file so that it only
//! ever happens once. The database is not the source of truth - the media
//! files are. If the database is deleted, it is rebuilt lazily as files are
//! browsed again.
//!
//! # Architecture
//! A single entity type is stored: the [`CacheEntry`], keyed by the file's
//! path relative to the media root. Entries are immutable once written; the
//! cache never refreshes them, even if the file on disk changes.

mod db;
mod entry;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::entry::CacheEntry;
pub use crate::repo::Repository;
