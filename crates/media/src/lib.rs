//! Media classification and thumbnail derivation.
//!
//! - [`classify`] and [`is_subtitle`] decide what a file is from its name.
//! - [`ThumbnailPipeline`] probes a file's duration and extracts a still
//!   frame through a [`MediaTool`] (normally [`Ffmpeg`]), degrading to an
//!   inline placeholder image whenever that is impossible.

mod classify;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod pipeline;
mod tool;

pub use crate::classify::{MediaKind, classify, extension, is_subtitle};
pub use crate::pipeline::{SeekOffset, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH, ThumbnailPipeline, ThumbnailRef, Timeouts};
pub use crate::tool::{Ffmpeg, MediaTool};
