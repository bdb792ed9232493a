//! Reading a single directory level.
//!
//! Shared by the scanner and search. Neither of them ever fails because of
//! the filesystem: a directory that cannot be read contributes nothing, and
//! an entry that cannot be inspected is skipped.

use crate::path::MediaPath;
use crate::sort::compare_names;
use std::io;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, DirEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Directory,
    File,
}

#[derive(Debug)]
pub(crate) struct WalkEntry {
    pub path: MediaPath,
    pub location: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: OffsetDateTime,
}
impl WalkEntry {
    pub fn name(&self) -> &str {
        self.path.name()
    }
}

/// List the directory at `location`, known to the caller as `path`.
///
/// Entries come back ordered by case-insensitive name. Symlinked files are
/// only listed when they resolve to somewhere inside `root`.
pub(crate) async fn read_dir(root: &Path, location: &Path, path: &MediaPath) -> Vec<WalkEntry> {
    let mut entries = match fs::read_dir(location).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %location.display(), "Directory does not exist; nothing to list");
            return Vec::new();
        },
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            tracing::warn!(dir = %location.display(), "Permission denied; treating directory as empty");
            return Vec::new();
        },
        Err(err) => {
            tracing::error!(dir = %location.display(), error = %err, "Cannot read directory; treating it as empty");
            return Vec::new();
        },
    };
    let mut listing = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(dir = %location.display(), error = %err, "Directory listing interrupted");
                break;
            },
        };
        match inspect(root, entry, path).await {
            Ok(Some(entry)) => listing.push(entry),
            Ok(None) => {},
            Err((entry, err)) => {
                tracing::warn!(path = %entry.display(), error = %err, "Skipping unreadable entry");
            },
        }
    }
    listing.sort_by(|a, b| compare_names(a.name(), b.name()));
    listing
}

async fn inspect(root: &Path, entry: DirEntry, parent: &MediaPath) -> Result<Option<WalkEntry>, (PathBuf, io::Error)> {
    let location = entry.path();
    let Ok(name) = entry.file_name().into_string() else {
        tracing::warn!(path = %location.display(), "Skipping entry with a non UTF-8 name");
        return Ok(None);
    };
    // Requested paths treat `\` as a separator, so such a name could never
    // be looked up again.
    if name.contains('\\') {
        tracing::warn!(path = %location.display(), "Skipping entry with a backslash in its name");
        return Ok(None);
    }
    let file_type = match entry.file_type().await {
        Ok(file_type) => file_type,
        Err(err) => return Err((location, err)),
    };
    let metadata = if file_type.is_symlink() {
        // Follow links to files, but never descend through a linked
        // directory: it could loop, or lead out of the media root.
        let target = match fs::metadata(&location).await {
            Ok(target) if target.is_dir() => {
                tracing::debug!(path = %location.display(), "Not following directory symlink");
                return Ok(None);
            },
            Ok(target) => target,
            Err(_) => {
                tracing::debug!(path = %location.display(), "Skipping broken symlink");
                return Ok(None);
            },
        };
        if !resolves_inside(root, &location).await {
            tracing::debug!(path = %location.display(), "Not following symlink out of the media root");
            return Ok(None);
        }
        target
    } else {
        match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(err) => return Err((location, err)),
        }
    };
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else if metadata.is_file() {
        EntryKind::File
    } else {
        // Sockets, FIFOs, devices.
        return Ok(None);
    };
    Ok(Some(WalkEntry {
        path: parent.join(&name),
        location,
        kind,
        size: if kind == EntryKind::File { metadata.len() } else { 0 },
        modified: metadata.modified().map(OffsetDateTime::from).unwrap_or(OffsetDateTime::UNIX_EPOCH),
    }))
}

async fn resolves_inside(root: &Path, link: &Path) -> bool {
    let Ok(target) = fs::canonicalize(link).await else {
        return false;
    };
    let root = fs::canonicalize(root).await.unwrap_or_else(|_| root.to_path_buf());
    target.starts_with(root)
}
