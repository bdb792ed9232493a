//! Root-relative media paths.
//!
//! Every file and folder under the media root is identified by a
//! [`MediaPath`]: a `/`-separated path relative to the root. It is the cache
//! key, the identifier handed to other subsystems, and the only form in which
//! callers may name something to look at. Parsing one is where path
//! traversal is stopped, before anything touches the filesystem.

use crate::error::{ErrorKind, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Folder label used for matches at the top level of the media root.
pub const ROOT_LABEL: &str = "Root";

/// A normalized path relative to the media root.
///
/// The empty path is the root itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MediaPath(String);

impl MediaPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Validate and normalize a requested path.
    ///
    /// Backslashes are treated as separators, `.` and empty segments are
    /// dropped, and `..` is resolved lexically. A `..` that would climb above
    /// the root, a null byte, or a segment the host would interpret as
    /// anything other than a plain name (such as a drive prefix) is rejected.
    ///
    /// ```
    /// use lumen_library::MediaPath;
    /// assert_eq!(MediaPath::parse("movies//./a.mp4").unwrap().as_str(), "movies/a.mp4");
    /// assert_eq!(MediaPath::parse("movies\\2024\\..").unwrap().as_str(), "movies");
    /// assert!(MediaPath::parse("").unwrap().is_root());
    /// assert!(MediaPath::parse("../../etc").is_err());
    /// assert!(MediaPath::parse("movies/../../etc").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || ErrorKind::InvalidPath(raw.to_string());
        let normalized = raw.replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    if segments.pop().is_none() {
                        exn::bail!(invalid());
                    }
                },
                name => {
                    if name.contains('\0') {
                        exn::bail!(invalid());
                    }
                    let mut components = Path::new(name).components();
                    if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
                        exn::bail!(invalid());
                    }
                    segments.push(name);
                },
            }
        }
        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path of a direct child called `name`.
    pub fn join(&self, name: &str) -> Self {
        match self.is_root() {
            true => Self(name.to_string()),
            false => Self(format!("{}/{}", self.0, name)),
        }
    }

    /// Last segment; empty for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }

    /// `None` for the root, the root (empty path) for top-level entries.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rsplit_once('/') {
            Some((parent, _)) => Self(parent.to_string()),
            None => Self::root(),
        })
    }

    /// Name of the folder containing this entry, as shown next to search
    /// results: its parent path, or [`ROOT_LABEL`] at the top level.
    pub fn folder_label(&self) -> String {
        match self.parent() {
            Some(parent) if !parent.is_root() => parent.0,
            _ => ROOT_LABEL.to_string(),
        }
    }

    /// Location of this path on disk under `root`.
    pub fn to_fs(&self, root: &Path) -> PathBuf {
        self.0.split('/').filter(|s| !s.is_empty()).fold(root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
