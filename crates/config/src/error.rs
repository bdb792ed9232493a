//! Errors from loading and validating configuration.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every variant means the same thing to the caller: fix the configuration
/// and try again. None of them are retryable.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// The config file extension is not one of toml, yaml, yml or json.
    #[display("unsupported config format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The merged configuration could not be deserialized.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// No media root was configured.
    #[display("media_root is not set")]
    MissingMediaRoot,
    /// The media root does not exist or is not a directory.
    #[display("media_root is not a directory: {}", _0.display())]
    MediaRootNotDirectory(#[error(not(source))] PathBuf),
    /// Thumbnails would be written into the (read-only) media tree.
    #[display("thumbnails.dir must not be inside media_root: {}", _0.display())]
    ThumbnailsInsideMediaRoot(#[error(not(source))] PathBuf),
    #[display("{_0} must be greater than zero")]
    ZeroTimeout(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
