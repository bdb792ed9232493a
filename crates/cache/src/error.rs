//! Errors raised by the metadata cache.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// An insert collided with an existing entry that then could not be read.
    #[display("entry not found: {_0}")]
    EntryNotFound(#[error(not(source))] String),
    /// A stored row does not map back onto a [`CacheEntry`](crate::CacheEntry).
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY surfaces as a generic database error.
        matches!(self, Self::Database | Self::EntryNotFound(_))
    }
}
