//! Compute-or-fetch access to derived file metadata.

use crate::error::{ErrorKind, Result};
use crate::node::MediaNode;
use crate::path::MediaPath;
use exn::ResultExt;
use lumen_cache::{CacheEntry, Repository};
use lumen_media::ThumbnailPipeline;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::instrument;

type InFlight = Arc<OnceCell<CacheEntry>>;

/// Derived metadata (thumbnail, duration, size) per media file, computed
/// at most once and then served from the [`Repository`].
///
/// Concurrent misses on the same path share a single computation: the first
/// caller runs the pipeline, everyone else waits for its result.
#[derive(Debug)]
pub struct MetadataCache {
    root: PathBuf,
    thumbnails: PathBuf,
    repo: Repository,
    pipeline: ThumbnailPipeline,
    in_flight: Mutex<HashMap<MediaPath, InFlight>>,
}

impl MetadataCache {
    /// `root` is the media root that paths are relative to; extracted frames
    /// are written into `thumbnails`.
    pub fn new(root: impl Into<PathBuf>, thumbnails: impl Into<PathBuf>, repo: Repository, pipeline: ThumbnailPipeline) -> Self {
        Self {
            root: root.into(),
            thumbnails: thumbnails.into(),
            repo,
            pipeline,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stable artifact name for a path. Repeated misses for the same path
    /// always write to the same thumbnail file.
    pub fn thumbnail_key(path: &MediaPath) -> String {
        blake3::hash(path.as_str().as_bytes()).to_string()
    }

    /// The stored entry for `path`, computing and storing it first if there
    /// is none.
    #[instrument(level = "debug", skip_all, fields(path = %path))]
    pub async fn get_or_compute(&self, path: &MediaPath) -> Result<CacheEntry> {
        if let Some(entry) = self.repo.get(path).await.or_raise(|| ErrorKind::Cache)? {
            return Ok(entry);
        }
        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(path.clone()).or_default())
        };
        let result = cell.get_or_try_init(|| self.compute(path)).await.cloned();
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(path).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            in_flight.remove(path);
        }
        result
    }

    async fn compute(&self, path: &MediaPath) -> Result<CacheEntry> {
        // Someone may have finished computing this between our miss and us
        // claiming the in-flight slot.
        if let Some(entry) = self.repo.get(path).await.or_raise(|| ErrorKind::Cache)? {
            return Ok(entry);
        }
        let source = path.to_fs(&self.root);
        let output = self.thumbnails.join(format!("{}.jpg", Self::thumbnail_key(path)));
        let thumbnail = self.pipeline.generate(&source, &output).await;
        let file_size = tokio::fs::metadata(&source).await.map(|m| m.len()).unwrap_or(0);
        let duration = self.pipeline.probe_duration(&source).await;
        let entry = CacheEntry::new(path.as_str(), thumbnail, duration, file_size);
        let stored = self.repo.insert(&entry).await.or_raise(|| ErrorKind::Cache)?;
        tracing::debug!(path = %path, placeholder = stored.thumbnail.is_placeholder(), duration = ?stored.duration, "Cached media metadata");
        Ok(stored)
    }

    /// Attach metadata to a file node. A cache failure is logged and the node
    /// is returned without it; one bad lookup never fails a whole listing.
    pub(crate) async fn annotate(&self, node: MediaNode) -> MediaNode {
        match self.get_or_compute(&node.path).await {
            Ok(entry) => node.with_metadata(&entry),
            Err(err) => {
                tracing::warn!(path = %node.path, error = ?err, "Metadata unavailable");
                node
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_cache::Database;
    use lumen_media::mock::MockTool;
    use std::time::Duration;

    struct Fixture {
        media: tempfile::TempDir,
        thumbnails: tempfile::TempDir,
        tool: Arc<MockTool>,
        repo: Repository,
        cache: MetadataCache,
    }

    async fn fixture(tool: MockTool) -> Fixture {
        let media = tempfile::tempdir().unwrap();
        let thumbnails = tempfile::tempdir().unwrap();
        std::fs::create_dir(media.path().join("movies")).unwrap();
        std::fs::write(media.path().join("movies/a.mp4"), vec![0u8; 2048]).unwrap();
        let tool = Arc::new(tool);
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let pipeline = ThumbnailPipeline::new(tool.clone());
        let cache = MetadataCache::new(media.path(), thumbnails.path(), repo.clone(), pipeline);
        Fixture { media, thumbnails, tool, repo, cache }
    }

    fn movie() -> MediaPath {
        MediaPath::parse("movies/a.mp4").unwrap()
    }

    #[test]
    fn test_thumbnail_key_is_stable() {
        let key = MetadataCache::thumbnail_key(&movie());
        assert_eq!(key, MetadataCache::thumbnail_key(&movie()));
        assert_eq!(key.len(), 64);
        assert_ne!(key, MetadataCache::thumbnail_key(&MediaPath::parse("movies/b.mp4").unwrap()));
    }

    #[tokio::test]
    async fn test_computes_once_then_serves_from_store() {
        let fx = fixture(MockTool::new().with_duration(300.0)).await;
        let first = fx.cache.get_or_compute(&movie()).await.unwrap();
        // One probe inside the pipeline, one more for the stored duration.
        assert_eq!(fx.tool.probe_calls(), 2);
        assert_eq!(fx.tool.extract_offsets().len(), 1);
        assert_eq!(first.duration, Some(300.0));
        assert_eq!(first.file_size, 2048);
        let expected = format!("/static/thumbnails/{}.jpg", MetadataCache::thumbnail_key(&movie()));
        assert_eq!(first.thumbnail.as_str(), expected);
        assert!(fx.thumbnails.path().join(format!("{}.jpg", MetadataCache::thumbnail_key(&movie()))).exists());

        let second = fx.cache.get_or_compute(&movie()).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(fx.tool.probe_calls(), 2);
        assert_eq!(fx.tool.extract_offsets().len(), 1);
        assert_eq!(fx.repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_entries_are_never_refreshed() {
        let fx = fixture(MockTool::new().with_duration(300.0)).await;
        let first = fx.cache.get_or_compute(&movie()).await.unwrap();
        std::fs::write(fx.media.path().join("movies/a.mp4"), b"replaced").unwrap();
        let second = fx.cache.get_or_compute(&movie()).await.unwrap();
        assert_eq!(second.file_size, first.file_size);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_coalesce() {
        let fx = fixture(MockTool::new().with_duration(30.0).with_delay(Duration::from_millis(50))).await;
        let path = movie();
        let lookups = (0..8).map(|_| fx.cache.get_or_compute(&path));
        let results = futures::future::join_all(lookups).await;
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert_eq!(result.as_ref().unwrap(), first);
        }
        assert_eq!(fx.tool.extract_offsets().len(), 1);
        assert_eq!(fx.tool.probe_calls(), 2);
        assert!(fx.cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_gets_placeholder() {
        let fx = fixture(MockTool::new().with_duration(30.0)).await;
        let entry = fx.cache.get_or_compute(&MediaPath::parse("movies/gone.mp4").unwrap()).await.unwrap();
        assert!(entry.thumbnail.is_placeholder());
        assert_eq!(entry.file_size, 0);
        assert!(fx.tool.extract_offsets().is_empty());
    }

    #[tokio::test]
    async fn test_failed_extraction_is_cached_as_placeholder() {
        let fx = fixture(MockTool::new().failing_extraction()).await;
        let entry = fx.cache.get_or_compute(&movie()).await.unwrap();
        assert!(entry.thumbnail.is_placeholder());
        assert_eq!(entry.duration, None);
        // First attempt at the default offset, then the retry from the start.
        assert_eq!(fx.tool.extract_offsets().len(), 2);
        let again = fx.cache.get_or_compute(&movie()).await.unwrap();
        assert_eq!(again, entry);
        assert_eq!(fx.tool.extract_offsets().len(), 2);
    }
}
