use crate::CacheEntry;
use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use lumen_media::ThumbnailRef;
use time::OffsetDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    pub(crate) file_path: String,
    pub(crate) thumbnail: String,
    pub(crate) duration: Option<f64>,
    pub(crate) resolution: Option<String>,
    pub(crate) file_size: i64,
    pub(crate) created_at: i64,
}
impl TryFrom<&CacheEntry> for EntryRow {
    type Error = Error;
    fn try_from(entry: &CacheEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            file_path: entry.file_path.clone(),
            thumbnail: entry.thumbnail.to_string(),
            duration: entry.duration,
            resolution: entry.resolution.clone(),
            file_size: i64::try_from(entry.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            created_at: entry.created_at.unix_timestamp(),
        })
    }
}
impl TryFrom<EntryRow> for CacheEntry {
    type Error = Error;
    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            file_path: row.file_path,
            thumbnail: ThumbnailRef::from(row.thumbnail),
            duration: row.duration,
            resolution: row.resolution,
            file_size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            created_at: OffsetDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("creation date"))?,
        })
    }
}
