//! Connection pool for the metadata cache.

use exn::ResultExt;
use sqlx::Executor;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Per-connection settings that [`SqliteConnectOptions`] has no setter for.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA wal_autocheckpoint = 800;
    PRAGMA cache_size = -4096;
    PRAGMA temp_store = MEMORY;
";

/// Where the cache lives.
#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Memory,
}

impl Target {
    /// Browse requests read concurrently, but every pooled connection to
    /// `:memory:` would open its own empty database.
    fn max_connections(&self) -> u32 {
        match self {
            Self::File(_) => 5,
            Self::Memory => 1,
        }
    }

    fn options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // The first visit to a folder of new files writes one row per
            // file, all at once.
            .busy_timeout(Duration::from_millis(1500));
        match self {
            Self::File(path) => options.filename(path).create_if_missing(true),
            Self::Memory => options.filename(":memory:"),
        }
    }
}

/// Pooled SQLite handle, migrated and ready to use.
///
/// Pass it to [`Repository`](crate::Repository) to read and write entries.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the cache file at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening metadata cache");
        Self::open(Target::File(path.to_path_buf())).await
    }

    /// A throwaway cache that disappears with its connection.
    ///
    /// Left outside `#[cfg(test)]` so dependent crates can use it in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::open(Target::Memory).await
    }

    async fn open(target: Target) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(target.max_connections())
            .after_connect(|conn, _meta| Box::pin(async move { conn.execute(CONNECTION_PRAGMAS).await.map(drop) }))
            .connect_with(target.options())
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[instrument("migrating metadata cache", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Optimize and close every pooled connection.
    pub async fn close(&self) {
        if let Err(err) = self.pool.execute("PRAGMA optimize").await {
            tracing::debug!(error = %err, "Skipped optimizing metadata cache");
        }
        self.pool.close().await;
    }
}
