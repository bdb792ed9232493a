//! Thumbnail and duration derivation.
//!
//! [`ThumbnailPipeline::generate`] is infallible by construction: every
//! failure path (missing source, missing tools, timeouts, bad output) ends
//! in [`ThumbnailRef::placeholder`].

use crate::tool::MediaTool;
use base64::Engine;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::instrument;

pub const THUMBNAIL_WIDTH: u32 = 320;
pub const THUMBNAIL_HEIGHT: u32 = 180;

static PLACEHOLDER: LazyLock<String> = LazyLock::new(|| {
    let svg = format!(
        concat!(
            r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">"#,
            r##"<rect width="100%" height="100%" fill="#333"/>"##,
            r#"<text x="50%" y="50%" text-anchor="middle" dy=".3em" fill="white" font-family="Arial" font-size="24">"#,
            "\u{1F3AC}</text></svg>",
        ),
        w = THUMBNAIL_WIDTH,
        h = THUMBNAIL_HEIGHT,
    );
    format!("data:image/svg+xml;base64,{}", base64::engine::general_purpose::STANDARD.encode(svg))
});

/// Where to find a thumbnail image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ThumbnailRef {
    /// An extracted frame, served from the thumbnail artifact area.
    Url(String),
    /// A self-contained `data:` URI.
    Inline(String),
}
impl ThumbnailRef {
    /// The generated fallback image, used whenever real extraction fails.
    pub fn placeholder() -> Self {
        Self::Inline(PLACEHOLDER.clone())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Inline(s) => s,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.as_str() == PLACEHOLDER.as_str()
    }
}
impl From<String> for ThumbnailRef {
    fn from(value: String) -> Self {
        match value.starts_with("data:") {
            true => Self::Inline(value),
            false => Self::Url(value),
        }
    }
}
impl fmt::Display for ThumbnailRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp within a media file at which to grab a frame, in whole seconds.
///
/// Displays as `HH:MM:SS`, which is what `ffmpeg -ss` expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeekOffset(u32);
impl SeekOffset {
    /// Far enough in to skip most intros and studio logos.
    pub const PREFERRED: Self = Self(55);
    /// Used when the duration is unknown.
    pub const DEFAULT: Self = Self(10);
    /// Last resort, also the retry offset.
    pub const START: Self = Self(1);

    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Pick the latest of 55s, 10s, 5s or 1s that lies strictly before the
    /// end of the media.
    pub fn choose(duration: Option<f64>) -> Self {
        match duration {
            None => Self::DEFAULT,
            Some(d) if d > 55.0 => Self::PREFERRED,
            Some(d) if d > 10.0 => Self(10),
            Some(d) if d > 5.0 => Self(5),
            Some(_) => Self::START,
        }
    }
}
impl fmt::Display for SeekOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.0 / 3600, (self.0 % 3600) / 60, self.0 % 60)
    }
}

/// Time budgets for each external tool invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub probe: Duration,
    pub extract: Duration,
    pub retry: Duration,
}
impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(15),
            extract: Duration::from_secs(45),
            retry: Duration::from_secs(30),
        }
    }
}

/// Derives a still-frame thumbnail and duration for one media file.
#[derive(Clone)]
pub struct ThumbnailPipeline {
    tool: Arc<dyn MediaTool>,
    timeouts: Timeouts,
    url_prefix: String,
}
impl fmt::Debug for ThumbnailPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailPipeline")
            .field("timeouts", &self.timeouts)
            .field("url_prefix", &self.url_prefix)
            .finish_non_exhaustive()
    }
}
impl ThumbnailPipeline {
    pub const DEFAULT_URL_PREFIX: &'static str = "/static/thumbnails";

    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self {
            tool,
            timeouts: Timeouts::default(),
            url_prefix: Self::DEFAULT_URL_PREFIX.to_string(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Prefix of the URL under which extracted frames are served.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Duration of the media file in seconds, or `None` if the probe failed
    /// for any reason (missing tool, bad exit, garbage output, timeout).
    pub async fn probe_duration(&self, source: &Path) -> Option<f64> {
        match tokio::time::timeout(self.timeouts.probe, self.tool.probe_duration(source)).await {
            Ok(Ok(seconds)) => Some(seconds),
            Ok(Err(err)) => {
                tracing::debug!(source = %source.display(), error = ?err, "Could not probe duration");
                None
            },
            Err(_) => {
                tracing::warn!(source = %source.display(), timeout = ?self.timeouts.probe, "Duration probe timed out");
                None
            },
        }
    }

    pub fn choose_seek_offset(duration: Option<f64>) -> SeekOffset {
        SeekOffset::choose(duration)
    }

    /// Extract one frame at `offset`, retrying once from the start of the
    /// media (on a shorter budget) if that fails.
    pub async fn extract_frame(&self, source: &Path, offset: SeekOffset, output: &Path) -> bool {
        if self.attempt_extraction(source, offset, output, self.timeouts.extract).await {
            return true;
        }
        if offset == SeekOffset::START {
            return false;
        }
        tracing::debug!(source = %source.display(), "Retrying frame extraction from {}", SeekOffset::START);
        self.attempt_extraction(source, SeekOffset::START, output, self.timeouts.retry).await
    }

    async fn attempt_extraction(&self, source: &Path, offset: SeekOffset, output: &Path, budget: Duration) -> bool {
        match tokio::time::timeout(budget, self.tool.extract_frame(source, offset, output)).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                tracing::debug!(source = %source.display(), %offset, error = ?err, "Frame extraction failed");
                false
            },
            Err(_) => {
                tracing::warn!(source = %source.display(), %offset, timeout = ?budget, "Frame extraction timed out");
                false
            },
        }
    }

    /// Produce a thumbnail for `source`, writing the extracted frame to
    /// `output`. Always returns a usable reference.
    #[instrument(level = "debug", skip_all, fields(source = %source.display(), output = %output.display()))]
    pub async fn generate(&self, source: &Path, output: &Path) -> ThumbnailRef {
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            tracing::warn!(source = %source.display(), "Media file not found; using placeholder thumbnail");
            return ThumbnailRef::placeholder();
        }
        let Some(file_name) = output.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(output = %output.display(), "Unusable thumbnail output path; using placeholder");
            return ThumbnailRef::placeholder();
        };
        if let Some(parent) = output.parent()
            && let Err(err) = tokio::fs::create_dir_all(parent).await
        {
            tracing::warn!(dir = %parent.display(), error = %err, "Cannot create thumbnail directory; using placeholder");
            return ThumbnailRef::placeholder();
        }
        let duration = self.probe_duration(source).await;
        let offset = Self::choose_seek_offset(duration);
        tracing::debug!(?duration, %offset, "Extracting thumbnail frame");
        if self.extract_frame(source, offset, output).await {
            tracing::info!(source = %source.display(), "Thumbnail generated");
            return ThumbnailRef::Url(format!("{}/{}", self.url_prefix, file_name));
        }
        tracing::info!(source = %source.display(), "Thumbnail extraction failed; using placeholder");
        ThumbnailRef::placeholder()
    }
}
