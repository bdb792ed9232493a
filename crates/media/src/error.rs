//! Media tool errors.
//!
//! None of these ever reach the callers of
//! [`ThumbnailPipeline`](crate::ThumbnailPipeline); they exist so that tool
//! implementations can say *why* they failed, and the pipeline can log it
//! before falling back to a placeholder.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media tool operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The external executable could not be found or spawned.
    #[display("{_0} not detected on your system")]
    ToolNotFound(#[error(not(source))] &'static str),
    /// The external executable did not finish within its time budget.
    #[display("{_0} timed out")]
    ToolTimeout(#[error(not(source))] &'static str),
    /// The external executable exited unsuccessfully. If there is no exit
    /// code then it was killed by a signal.
    #[display("{tool} exited with code: {code:?}")]
    ToolFailed { tool: &'static str, code: Option<i32> },
    /// The tool succeeded, but what it printed (or wrote) is not usable.
    #[display("unusable output from {_0}")]
    InvalidOutput(#[error(not(source))] &'static str),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ToolTimeout(_) | Self::ToolFailed { .. } | Self::Io)
    }
}
