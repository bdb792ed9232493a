//! Subtitle tracks that belong to a video.
//!
//! Subtitles live in their own flat directory (not in the media tree) and
//! are matched to a video by file name: `movie.mkv` picks up `movie.srt`,
//! `movie.en.vtt`, `movie.pt-BR.ass` and so on.

use crate::path::MediaPath;
use crate::sort::compare_names;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Subtitle {
    pub name: String,
    pub url: String,
    /// Taken from a `<stem>.<language>.<ext>` file name, if present.
    pub language: Option<String>,
}

/// Where subtitle files are looked up and the URL they are served under.
#[derive(Clone, Debug, Default)]
pub struct SubtitleSource {
    dir: Option<PathBuf>,
    url_prefix: String,
}

impl SubtitleSource {
    pub fn new(dir: Option<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Subtitle files for `video`, in name order.
    ///
    /// Without a configured directory, or if it cannot be read, there are
    /// simply no subtitles.
    pub async fn find(&self, video: &MediaPath) -> Vec<Subtitle> {
        let Some(dir) = self.dir.as_deref() else {
            return Vec::new();
        };
        let stem = file_stem(video.name());
        if stem.is_empty() {
            return Vec::new();
        }
        let mut subtitles: Vec<Subtitle> = list_names(dir)
            .await
            .into_iter()
            .filter(|name| name.starts_with(stem) && lumen_media::is_subtitle(name))
            .map(|name| Subtitle {
                url: format!("{}/{}", self.url_prefix, name),
                language: language(stem, &name),
                name,
            })
            .collect();
        subtitles.sort_by(|a, b| compare_names(&a.name, &b.name));
        subtitles
    }
}

async fn list_names(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), error = %err, "Cannot read subtitles directory");
            return Vec::new();
        },
    };
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names
}

/// File name without its final extension.
fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

fn language(stem: &str, name: &str) -> Option<String> {
    let tag = file_stem(name).strip_prefix(stem)?.strip_prefix('.')?;
    let valid = !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("movie", "movie.srt", None)]
    #[case("movie", "movie.en.srt", Some("en"))]
    #[case("movie", "movie.pt-BR.vtt", Some("pt-BR"))]
    #[case("movie", "movie.director.commentary.srt", None)]
    #[case("movie", "movie2.en.srt", None)]
    fn test_language(#[case] stem: &str, #[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(language(stem, name).as_deref(), expected);
    }

    #[tokio::test]
    async fn test_find() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["movie.en.srt", "movie.srt", "movie.txt", "other.srt", "Movie.fr.srt", "movie.de.ASS"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let source = SubtitleSource::new(Some(dir.path().to_path_buf()), "/static/subtitles/");
        let video = MediaPath::parse("films/movie.mkv").unwrap();
        let found = source.find(&video).await;
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["movie.de.ASS", "movie.en.srt", "movie.srt"]);
        assert_eq!(found[1].url, "/static/subtitles/movie.en.srt");
        assert_eq!(found[1].language.as_deref(), Some("en"));
        assert_eq!(found[2].language, None);
    }

    #[tokio::test]
    async fn test_no_directory() {
        let video = MediaPath::parse("movie.mkv").unwrap();
        assert!(SubtitleSource::default().find(&video).await.is_empty());
        let missing = SubtitleSource::new(Some(PathBuf::from("/definitely/not/here")), "/subs");
        assert!(missing.find(&video).await.is_empty());
    }
}
