//! Directory scanning into a sorted [`MediaNode`] tree.
//!
//! The walk uses an explicit worklist rather than recursion, in two phases:
//! 1. Directories are listed as they are popped off the stack; every
//!    subdirectory found gets a slot (in discovery order) and is pushed for
//!    listing in turn. Media files are annotated with their metadata here.
//! 2. Slots are assembled back to front. A directory's slot always comes
//!    after its parent's, so by the time a folder node is built its children
//!    are already complete and sorted.

use crate::metadata::MetadataCache;
use crate::node::MediaNode;
use crate::path::MediaPath;
use crate::sort::{SortKey, SortOrder, sort_nodes};
use crate::walk::{self, EntryKind, WalkEntry};
use futures::StreamExt;
use std::path::PathBuf;

/// Maximum number of files per directory whose metadata is resolved at once.
/// Each cache miss can mean two external processes.
const METADATA_CONCURRENCY: usize = 4;

struct Slot {
    location: PathBuf,
    path: MediaPath,
    folders: Vec<(WalkEntry, usize)>,
    files: Vec<MediaNode>,
}
impl Slot {
    fn new(location: PathBuf, path: MediaPath) -> Self {
        Self { location, path, folders: Vec::new(), files: Vec::new() }
    }
}

/// Scan the directory at `location` (which is `base` relative to the media
/// root) and everything below it.
///
/// Unreadable directories come back empty rather than failing the scan, and
/// files that are not video or audio are left out.
pub(crate) async fn scan(cache: &MetadataCache, location: PathBuf, base: MediaPath, key: SortKey, order: SortOrder) -> Vec<MediaNode> {
    let mut slots = vec![Slot::new(location, base)];
    let mut stack = vec![0];
    while let Some(index) = stack.pop() {
        let listing = walk::read_dir(cache.root(), &slots[index].location, &slots[index].path).await;
        let mut files = Vec::new();
        for entry in listing {
            match entry.kind {
                EntryKind::Directory => {
                    let slot = slots.len();
                    slots.push(Slot::new(entry.location.clone(), entry.path.clone()));
                    stack.push(slot);
                    slots[index].folders.push((entry, slot));
                },
                EntryKind::File => {
                    let kind = lumen_media::classify(entry.name());
                    if kind.is_media() {
                        files.push(MediaNode::file(entry.path, kind, entry.size, entry.modified));
                    }
                },
            }
        }
        slots[index].files = futures::stream::iter(files)
            .map(|node| cache.annotate(node))
            .buffered(METADATA_CONCURRENCY)
            .collect()
            .await;
        tracing::trace!(dir = %slots[index].path, folders = slots[index].folders.len(), files = slots[index].files.len(), "Scanned directory");
    }

    let mut built: Vec<Option<Vec<MediaNode>>> = std::iter::repeat_with(|| None).take(slots.len()).collect();
    for (index, slot) in slots.into_iter().enumerate().rev() {
        let mut nodes = slot.files;
        for (entry, child) in slot.folders {
            let children = built[child].take().unwrap_or_default();
            nodes.push(MediaNode::folder(entry.path, entry.modified).with_children(children));
        }
        sort_nodes(&mut nodes, key, order);
        built[index] = Some(nodes);
    }
    built.first_mut().and_then(Option::take).unwrap_or_default()
}
