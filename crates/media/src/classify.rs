//! File name classification.
//!
//! Everything here works on the *name* only: no I/O, no errors.

use serde::Serialize;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "ogg", "ogv", "m4v", "mpg", "mpeg", "mp2", "mpe", "mpv",
    "m2v", "3gp", "3g2", "mxf", "roq", "nsv", "f4v", "f4p", "f4a", "f4b", "asf", "rm", "rmvb", "vob", "ts", "mts",
    "m2ts", "divx", "xvid",
];

// `ogg` is deliberately absent: it is checked as a video container first.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "oga", "wma", "m4a", "opus", "aiff", "au", "ra", "amr", "ac3", "dts", "ape", "mka",
];

const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass", "ssa"];

/// Media kind of a file, decided by its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Unknown,
}
impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        }
    }

    /// Whether files of this kind are indexed at all.
    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// The lowercased substring after the last `.` of a file name.
///
/// `".mp4"` has the extension `mp4`; `"movie."` has an empty extension and
/// `"README"` has none at all.
pub fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Classify a file name as video, audio or unknown.
///
/// ```
/// use lumen_media::{MediaKind, classify};
/// assert_eq!(classify("Holiday.MKV"), MediaKind::Video);
/// assert_eq!(classify("song.flac"), MediaKind::Audio);
/// assert_eq!(classify("notes.txt"), MediaKind::Unknown);
/// assert_eq!(classify(""), MediaKind::Unknown);
/// ```
pub fn classify(name: &str) -> MediaKind {
    let Some(ext) = extension(name) else {
        return MediaKind::Unknown;
    };
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Audio
    } else {
        MediaKind::Unknown
    }
}

/// Whether a file name looks like a subtitle track.
pub fn is_subtitle(name: &str) -> bool {
    extension(name).is_some_and(|ext| SUBTITLE_EXTENSIONS.contains(&ext.as_str()))
}
