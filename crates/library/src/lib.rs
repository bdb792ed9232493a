//! Browsing and searching a tree of media files.
//!
//! The [`Indexer`] walks the media root on every request (there is no
//! background indexing) and builds [`MediaNode`] trees or flat search results
//! from it. Each video or audio file it meets is annotated with metadata from
//! the [`MetadataCache`], which derives thumbnails and durations through the
//! [`ThumbnailPipeline`](lumen_media::ThumbnailPipeline) the first time a file
//! is seen and serves them from the database afterwards.

pub mod error;
mod indexer;
mod metadata;
mod node;
mod path;
mod scan;
mod search;
mod sort;
mod subtitles;
mod walk;

pub use crate::error::ParseParamError;
pub use crate::indexer::{Indexer, Listing};
pub use crate::metadata::MetadataCache;
pub use crate::node::{MediaNode, NodeKind};
pub use crate::path::{MediaPath, ROOT_LABEL};
pub use crate::search::{SearchMatch, SearchType};
pub use crate::sort::{SortKey, SortOrder, sort_nodes};
pub use crate::subtitles::{Subtitle, SubtitleSource};
