//! External media tools.
//!
//! The pipeline never shells out directly; it talks to a [`MediaTool`] so the
//! tools can be swapped (or mocked) without touching the fallback logic.
//! Time budgets are enforced by the caller: implementations must be safe to
//! cancel by dropping their future, which for [`Ffmpeg`] kills the child.

use crate::error::{ErrorKind, Result};
use crate::pipeline::{SeekOffset, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use async_trait::async_trait;
use exn::ResultExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

const FFPROBE: &str = "ffprobe";
const FFMPEG: &str = "ffmpeg";

/// Probing and frame extraction, as provided by an external program.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Duration of the media file in seconds.
    async fn probe_duration(&self, source: &Path) -> Result<f64>;

    /// Write a single `320x180` letterboxed JPEG frame taken at `offset` to
    /// `output`, overwriting anything already there.
    async fn extract_frame(&self, source: &Path, offset: SeekOffset, output: &Path) -> Result<()>;
}

/// The `ffprobe`/`ffmpeg` pair.
///
/// Executables are resolved once, up front. A missing executable is not an
/// error here; every call that needs it fails fast with
/// [`ToolNotFound`](ErrorKind::ToolNotFound) instead.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffprobe: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
}
impl Ffmpeg {
    /// Use explicitly configured executables (names looked up in `PATH`, or
    /// paths to the binaries themselves).
    pub fn with_executables(ffprobe: impl AsRef<OsStr>, ffmpeg: impl AsRef<OsStr>) -> Self {
        Self {
            ffprobe: Self::locate(FFPROBE, ffprobe.as_ref()),
            ffmpeg: Self::locate(FFMPEG, ffmpeg.as_ref()),
        }
    }

    fn locate(tool: &'static str, executable: &OsStr) -> Option<PathBuf> {
        match which::which(executable) {
            Ok(path) => {
                tracing::debug!(tool, path = %path.display(), "Discovered media tool");
                Some(path)
            },
            Err(_) => {
                tracing::info!(tool, executable = ?executable, "Media tool not found; thumbnails will use placeholders");
                None
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.ffprobe.is_some() && self.ffmpeg.is_some()
    }

    async fn run<I, S>(tool: &'static str, executable: Option<&Path>, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let Some(executable) = executable else {
            exn::bail!(ErrorKind::ToolNotFound(tool));
        };
        let output = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Whoever enforces the timeout does so by dropping this future.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => ErrorKind::ToolNotFound(tool),
                _ => ErrorKind::Io,
            })?;
        if !output.status.success() {
            tracing::debug!(tool, stderr = %String::from_utf8_lossy(&output.stderr).trim(), "Media tool failed");
            exn::bail!(ErrorKind::ToolFailed { tool, code: output.status.code() });
        }
        Ok(output)
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn probe_duration(&self, source: &Path) -> Result<f64> {
        let args: [&OsStr; 7] = [
            "-v".as_ref(),
            "quiet".as_ref(),
            "-show_entries".as_ref(),
            "format=duration".as_ref(),
            "-of".as_ref(),
            "csv=p=0".as_ref(),
            source.as_os_str(),
        ];
        let output = Self::run(FFPROBE, self.ffprobe.as_deref(), args).await?;
        parse_duration(&output.stdout)
    }

    async fn extract_frame(&self, source: &Path, offset: SeekOffset, output: &Path) -> Result<()> {
        let timestamp = offset.to_string();
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = THUMBNAIL_WIDTH,
            h = THUMBNAIL_HEIGHT,
        );
        let args: [&OsStr; 14] = [
            "-nostdin".as_ref(),
            "-i".as_ref(),
            source.as_os_str(),
            "-ss".as_ref(),
            timestamp.as_ref(),
            "-vframes".as_ref(),
            "1".as_ref(),
            "-q:v".as_ref(),
            "2".as_ref(),
            "-vf".as_ref(),
            filter.as_ref(),
            "-y".as_ref(),
            "-loglevel".as_ref(),
            "error".as_ref(),
        ];
        Self::run(FFMPEG, self.ffmpeg.as_deref(), args.into_iter().chain([output.as_os_str()])).await?;
        // ffmpeg happily exits zero without writing anything when the seek
        // lands past the end of the stream.
        let written = tokio::fs::metadata(output).await.or_raise(|| ErrorKind::InvalidOutput(FFMPEG))?;
        if written.len() == 0 {
            exn::bail!(ErrorKind::InvalidOutput(FFMPEG));
        }
        Ok(())
    }
}

/// Parse the single `format=duration` value printed by `ffprobe`.
fn parse_duration(stdout: &[u8]) -> Result<f64> {
    let text = std::str::from_utf8(stdout).or_raise(|| ErrorKind::InvalidOutput(FFPROBE))?;
    let seconds = text.trim().parse::<f64>().or_raise(|| ErrorKind::InvalidOutput(FFPROBE))?;
    if !seconds.is_finite() || seconds < 0.0 {
        exn::bail!(ErrorKind::InvalidOutput(FFPROBE));
    }
    Ok(seconds)
}
