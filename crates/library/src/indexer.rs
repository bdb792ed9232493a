use crate::error::{ErrorKind, Result};
use crate::metadata::MetadataCache;
use crate::node::{MediaNode, NodeKind};
use crate::path::MediaPath;
use crate::scan::scan;
use crate::search::{SearchMatch, SearchType, search, search_stream};
use crate::sort::{SortKey, SortOrder};
use crate::subtitles::{Subtitle, SubtitleSource};
use exn::ResultExt;
use futures::Stream;
use lumen_cache::{CacheEntry, Repository};
use lumen_media::ThumbnailPipeline;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One browsed directory level, with enough context to navigate from it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listing {
    pub items: Vec<MediaNode>,
    pub current_path: MediaPath,
    /// `None` at the root, the root (empty path) for top-level folders.
    pub parent_path: Option<MediaPath>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

/// Entry point for everything that reads the media tree.
///
/// Owns the metadata cache; every request is confined to the media root, and
/// requests that name something outside of it fail with
/// [`InvalidPath`](ErrorKind::InvalidPath).
#[derive(Debug)]
pub struct Indexer {
    cache: MetadataCache,
    subtitles: SubtitleSource,
}

impl Indexer {
    /// Index the tree under `media_root`, writing extracted thumbnails into
    /// `thumbnails`.
    pub fn new(
        media_root: impl AsRef<Path>,
        thumbnails: impl Into<PathBuf>,
        repo: Repository,
        pipeline: ThumbnailPipeline,
    ) -> Result<Self> {
        let media_root = media_root.as_ref();
        let root = media_root
            .canonicalize()
            .or_raise(|| ErrorKind::InvalidRoot(media_root.to_path_buf()))?;
        if !root.is_dir() {
            exn::bail!(ErrorKind::InvalidRoot(media_root.to_path_buf()));
        }
        tracing::debug!(root = %root.display(), "Media root resolved");
        Ok(Self {
            cache: MetadataCache::new(root, thumbnails, repo, pipeline),
            subtitles: SubtitleSource::default(),
        })
    }

    pub fn with_subtitles(mut self, subtitles: SubtitleSource) -> Self {
        self.subtitles = subtitles;
        self
    }

    pub fn root(&self) -> &Path {
        self.cache.root()
    }

    /// Validate a requested path and find it on disk.
    ///
    /// The lexical check in [`MediaPath::parse`] runs first. If the target
    /// exists, its resolved location (after symlinks) must also still be
    /// inside the root.
    async fn locate(&self, raw: &str) -> Result<(MediaPath, PathBuf)> {
        let path = MediaPath::parse(raw)?;
        let location = path.to_fs(self.root());
        if let Ok(resolved) = tokio::fs::canonicalize(&location).await
            && !resolved.starts_with(self.root())
        {
            tracing::warn!(path = %path, resolved = %resolved.display(), "Rejected path that resolves outside the media root");
            exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
        }
        Ok((path, location))
    }

    /// The sorted tree below `path` (empty for the media root itself).
    pub async fn browse(&self, path: &str, sort_by: SortKey, sort_order: SortOrder) -> Result<Listing> {
        let (path, location) = self.locate(path).await?;
        let items = scan(&self.cache, location, path.clone(), sort_by, sort_order).await;
        Ok(Listing {
            items,
            parent_path: path.parent(),
            current_path: path,
            sort_by,
            sort_order,
        })
    }

    /// Search the whole media tree.
    pub async fn search(&self, query: &str, search_type: SearchType) -> Vec<SearchMatch> {
        search(&self.cache, self.root().to_path_buf(), MediaPath::root(), query, search_type).await
    }

    /// Search below `base` only.
    pub async fn search_in(&self, base: &str, query: &str, search_type: SearchType) -> Result<Vec<SearchMatch>> {
        let (base, location) = self.locate(base).await?;
        Ok(search(&self.cache, location, base, query, search_type).await)
    }

    /// Like [`search`](Self::search), yielding matches as they are found.
    pub fn search_stream<'a>(&'a self, query: &str, search_type: SearchType) -> impl Stream<Item = SearchMatch> + 'a {
        search_stream(&self.cache, self.root().to_path_buf(), MediaPath::root(), query, search_type)
    }

    /// Cached (or freshly derived) metadata of a single media file.
    pub async fn metadata(&self, path: &str) -> Result<CacheEntry> {
        let (path, location) = self.locate(path).await?;
        let stat = match tokio::fs::metadata(&location).await {
            Ok(stat) => stat,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(path.to_string())),
            Err(err) => return Err(err).or_raise(|| ErrorKind::NotFound(path.to_string())),
        };
        if !stat.is_file() || !lumen_media::classify(path.name()).is_media() {
            exn::bail!(ErrorKind::NotMedia(path.to_string()));
        }
        self.cache.get_or_compute(&path).await
    }

    /// Every video in the tree, depth first in name order.
    pub async fn videos(&self) -> Vec<MediaNode> {
        let tree = scan(&self.cache, self.root().to_path_buf(), MediaPath::root(), SortKey::Name, SortOrder::Asc).await;
        let mut videos = Vec::new();
        let mut stack = vec![tree.into_iter()];
        while let Some(level) = stack.last_mut() {
            let Some(mut node) = level.next() else {
                stack.pop();
                continue;
            };
            match node.kind {
                NodeKind::Video => videos.push(node),
                NodeKind::Folder => stack.push(node.children.take().unwrap_or_default().into_iter()),
                NodeKind::Audio | NodeKind::Unknown => {},
            }
        }
        videos
    }

    /// Subtitle tracks for the video at `video_path`.
    pub async fn subtitles(&self, video_path: &str) -> Result<Vec<Subtitle>> {
        let video = MediaPath::parse(video_path)?;
        Ok(self.subtitles.find(&video).await)
    }
}
