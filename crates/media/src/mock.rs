//! Scriptable media tool for testing.

use crate::error::{ErrorKind, Result};
use crate::pipeline::SeekOffset;
use crate::tool::MediaTool;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory stand-in for `ffprobe`/`ffmpeg`.
///
/// By default probing fails (unknown duration) and extraction succeeds by
/// writing a few bytes to the output path. Every call is recorded so tests
/// can assert on how often, and at which offsets, the tool was invoked.
#[derive(Debug, Default)]
pub struct MockTool {
    duration: Option<f64>,
    delay: Option<Duration>,
    fail_extractions: usize,
    probes: AtomicUsize,
    extractions: Mutex<Vec<SeekOffset>>,
}

impl MockTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make probing report this duration.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the first extraction attempt only.
    pub fn failing_first_extraction(mut self) -> Self {
        self.fail_extractions = 1;
        self
    }

    /// Fail every extraction attempt.
    pub fn failing_extraction(mut self) -> Self {
        self.fail_extractions = usize::MAX;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Offsets of every extraction attempt so far, in call order.
    pub fn extract_offsets(&self) -> Vec<SeekOffset> {
        self.extractions.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MediaTool for MockTool {
    async fn probe_duration(&self, _source: &Path) -> Result<f64> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match self.duration {
            Some(seconds) => Ok(seconds),
            None => exn::bail!(ErrorKind::InvalidOutput("mock")),
        }
    }

    async fn extract_frame(&self, _source: &Path, offset: SeekOffset, output: &Path) -> Result<()> {
        let attempt = {
            let mut calls = self.extractions.lock().map_err(|_| ErrorKind::Io)?;
            calls.push(offset);
            calls.len()
        };
        self.pause().await;
        if attempt <= self.fail_extractions {
            exn::bail!(ErrorKind::ToolFailed { tool: "mock", code: Some(1) });
        }
        tokio::fs::write(output, b"\xFF\xD8\xFF\xD9").await.map_err(|_| ErrorKind::Io)?;
        Ok(())
    }
}
