use lumen_media::ThumbnailRef;
use serde::Serialize;
use time::OffsetDateTime;

/// Persisted metadata for one media file.
///
/// At most one entry exists per `file_path`, and once created it is never
/// updated or invalidated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Path relative to the media root, `/`-separated.
    pub file_path: String,
    pub thumbnail: ThumbnailRef,
    /// Duration in seconds, if it could be probed.
    pub duration: Option<f64>,
    /// Never populated yet; kept so a resolution probe can be added without
    /// a schema change.
    pub resolution: Option<String>,
    pub file_size: u64,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}
impl CacheEntry {
    pub fn new(file_path: impl Into<String>, thumbnail: ThumbnailRef, duration: Option<f64>, file_size: u64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            file_path: file_path.into(),
            thumbnail,
            duration,
            resolution: None,
            file_size,
            // Stored with second precision; keep in-memory entries comparable
            // with ones read back from the database.
            created_at: now.replace_nanosecond(0).unwrap_or(now),
        }
    }
}
