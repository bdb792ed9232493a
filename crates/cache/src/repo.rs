//! Repository for [`CacheEntry`] records.

use crate::error::{ErrorKind, Result};
use crate::models::EntryRow;
use crate::{CacheEntry, Database};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;

/// Reads and writes [`CacheEntry`] records.
///
/// There is deliberately no update or delete: entries are written once, the
/// first time a file's metadata is needed, and then only ever read.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the entry for a path relative to the media root.
    pub async fn get(&self, file_path: impl AsRef<str>) -> Result<Option<CacheEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(include_str!("../queries/get_entry.sql"))
            .bind(file_path.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(CacheEntry::try_from).transpose()
    }

    /// Persist a new entry, returning the entry that is actually stored.
    ///
    /// If an entry for the same path already exists (someone else got there
    /// first) the insert is not an error: the existing entry wins and is
    /// returned instead of `entry`.
    pub async fn insert(&self, entry: &CacheEntry) -> Result<CacheEntry> {
        let row = EntryRow::try_from(entry)?;
        let result = sqlx::query(include_str!("../queries/insert_entry.sql"))
            .bind(row.file_path.as_str())
            .bind(row.thumbnail.as_str())
            .bind(row.duration)
            .bind(row.resolution.as_deref())
            .bind(row.file_size)
            .bind(row.created_at)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => CacheEntry::try_from(row),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                tracing::debug!(path = %entry.file_path, "Cache entry already exists; keeping the stored one");
                self.get(&entry.file_path)
                    .await?
                    .ok_or_raise(|| ErrorKind::EntryNotFound(entry.file_path.clone()))
            },
            Err(err) => Err(err).or_raise(|| ErrorKind::Database),
        }
    }

    /// Number of entries in the cache.
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_entries.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("entry count"))
    }
}
