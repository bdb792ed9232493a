use crate::path::MediaPath;
use lumen_cache::CacheEntry;
use lumen_media::{MediaKind, ThumbnailRef};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Video,
    Audio,
    Unknown,
}
impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        }
    }
}
impl From<MediaKind> for NodeKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self::Video,
            MediaKind::Audio => Self::Audio,
            MediaKind::Unknown => Self::Unknown,
        }
    }
}

/// One file or folder in a scanned tree.
///
/// Built fresh for every request and never persisted; only the derived
/// metadata of files (thumbnail, duration) is cached.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MediaNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: MediaPath,
    /// Zero for folders.
    pub size: u64,
    #[serde(with = "time::serde::timestamp")]
    pub modified: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ThumbnailRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Only present on folders produced by a scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MediaNode>>,
}

impl MediaNode {
    pub(crate) fn folder(path: MediaPath, modified: OffsetDateTime) -> Self {
        Self {
            name: path.name().to_string(),
            kind: NodeKind::Folder,
            path,
            size: 0,
            modified,
            thumbnail: None,
            duration: None,
            resolution: None,
            children: None,
        }
    }

    pub(crate) fn file(path: MediaPath, kind: MediaKind, size: u64, modified: OffsetDateTime) -> Self {
        Self {
            name: path.name().to_string(),
            kind: kind.into(),
            path,
            size,
            modified,
            thumbnail: None,
            duration: None,
            resolution: None,
            children: None,
        }
    }

    pub(crate) fn with_children(mut self, children: Vec<MediaNode>) -> Self {
        self.children = Some(children);
        self
    }

    /// Fill in the derived metadata. The size stays as read from disk.
    pub(crate) fn with_metadata(mut self, entry: &CacheEntry) -> Self {
        self.thumbnail = Some(entry.thumbnail.clone());
        self.duration = entry.duration;
        self.resolution = entry.resolution.clone();
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn children(&self) -> &[MediaNode] {
        self.children.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_serialization() {
        let path = MediaPath::parse("movies/a.mp4").unwrap();
        let entry = CacheEntry::new(path.as_str(), ThumbnailRef::Url("/t/abc.jpg".into()), Some(300.0), 10);
        let node = MediaNode::file(path, MediaKind::Video, 10, OffsetDateTime::UNIX_EPOCH).with_metadata(&entry);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "name": "a.mp4",
                "type": "video",
                "path": "movies/a.mp4",
                "size": 10,
                "modified": 0,
                "thumbnail": "/t/abc.jpg",
                "duration": 300.0,
            })
        );
    }

    #[test]
    fn test_folder_serialization() {
        let node = MediaNode::folder(MediaPath::parse("movies").unwrap(), OffsetDateTime::UNIX_EPOCH).with_children(vec![]);
        assert!(node.is_folder());
        assert!(node.children().is_empty());
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "name": "movies", "type": "folder", "path": "movies", "size": 0, "modified": 0, "children": [] })
        );
    }
}
