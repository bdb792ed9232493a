//! Substring search over file or folder names.

use crate::error::ParseParamError;
use crate::metadata::MetadataCache;
use crate::node::MediaNode;
use crate::path::MediaPath;
use crate::walk::{self, EntryKind, WalkEntry};
use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What a search query is matched against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Names of video and audio files.
    #[default]
    File,
    /// Names of directories.
    Folder,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl FromStr for SearchType {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            _ => Err(ParseParamError {
                param: "search type",
                value: s.to_string(),
                expected: "file, folder",
            }),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search hit, together with the folder it was found in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchMatch {
    #[serde(flatten)]
    pub node: MediaNode,
    /// Parent path of the match, or `"Root"` at the top level.
    pub folder: String,
}
impl SearchMatch {
    fn new(node: MediaNode) -> Self {
        let folder = node.path.folder_label();
        Self { node, folder }
    }
}

/// Stream matches for `query` below `location` (which is `base` relative to
/// the media root), depth first, each directory in name order.
///
/// The query is trimmed and matched case-insensitively. An empty query ends
/// the stream before anything is read. Folder matches are still descended
/// into. Matched files carry their cached metadata, folders never do.
pub(crate) fn search_stream<'a>(
    cache: &'a MetadataCache,
    location: PathBuf,
    base: MediaPath,
    query: &str,
    search_type: SearchType,
) -> impl Stream<Item = SearchMatch> + 'a {
    let needle = query.trim().to_lowercase();
    stream! {
        if needle.is_empty() {
            return;
        }
        // One iterator per open directory; the top of the stack is the one
        // currently being read.
        let mut stack: Vec<std::vec::IntoIter<WalkEntry>> = vec![walk::read_dir(cache.root(), &location, &base).await.into_iter()];
        while let Some(level) = stack.last_mut() {
            let Some(entry) = level.next() else {
                stack.pop();
                continue;
            };
            let matches = entry.name().to_lowercase().contains(&needle);
            match entry.kind {
                EntryKind::Directory => {
                    if search_type == SearchType::Folder && matches {
                        yield SearchMatch::new(MediaNode::folder(entry.path.clone(), entry.modified));
                    }
                    stack.push(walk::read_dir(cache.root(), &entry.location, &entry.path).await.into_iter());
                },
                EntryKind::File if search_type == SearchType::File && matches => {
                    let kind = lumen_media::classify(entry.name());
                    if kind.is_media() {
                        let node = MediaNode::file(entry.path, kind, entry.size, entry.modified);
                        yield SearchMatch::new(cache.annotate(node).await);
                    }
                },
                EntryKind::File => {},
            }
        }
    }
}

/// Collect every match of [`search_stream`].
pub(crate) async fn search(
    cache: &MetadataCache,
    location: PathBuf,
    base: MediaPath,
    query: &str,
    search_type: SearchType,
) -> Vec<SearchMatch> {
    search_stream(cache, location, base, query, search_type).collect().await
}
