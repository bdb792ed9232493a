//! Request errors for browsing, searching and metadata lookups.
//!
//! Filesystem trouble while walking the tree is never an error here; it is
//! logged and the affected directory reads as empty. What remains are
//! problems with the *request* itself, and the cache store being unavailable.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested path is malformed or resolves outside the media root.
    #[display("invalid path: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
    /// The media root itself does not exist or cannot be resolved.
    #[display("media root is unavailable: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    #[display("no such file: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The path exists but is not a video or audio file.
    #[display("not a media file: {_0}")]
    NotMedia(#[error(not(source))] String),
    #[display("metadata cache unavailable")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache)
    }
}

/// A query parameter (sort key, sort order, search type) was not recognized.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("unknown {param} {value:?}, expected one of: {expected}")]
pub struct ParseParamError {
    pub(crate) param: &'static str,
    pub(crate) value: String,
    pub(crate) expected: &'static str,
}
