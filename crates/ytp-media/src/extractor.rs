//! The upstream extraction seam.
//!
//! Handlers never talk to the extraction tool directly; they go through
//! [`Extractor`], which the server wires to [`crate::YtDlpExtractor`] and
//! tests replace with a mock.

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::error::MediaResult;
use crate::models::{RawPlaylist, RawVideo};

/// A byte stream of media data. Dropping it cancels the upstream transfer.
pub type MediaStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Upstream format selector for media streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSelector {
    /// A video rendition. `None` asks for the highest muxed rendition.
    Video { format: Option<String> },
    /// The highest-bitrate audio-only rendition.
    Audio,
}

impl MediaSelector {
    /// Selector for the highest muxed video rendition.
    pub const HIGHEST_VIDEO: &'static str = "best[ext=mp4]/best";

    /// Selector for the highest-bitrate audio rendition.
    pub const HIGHEST_AUDIO: &'static str = "bestaudio";

    pub fn video(format: Option<String>) -> Self {
        let format = format.filter(|f| !f.trim().is_empty());
        Self::Video { format }
    }

    /// Format expression handed to the extraction tool. Caller-supplied
    /// tokens are passed through as-is.
    pub fn format_expr(&self) -> &str {
        match self {
            MediaSelector::Video { format: Some(f) } => f.as_str(),
            MediaSelector::Video { format: None } => Self::HIGHEST_VIDEO,
            MediaSelector::Audio => Self::HIGHEST_AUDIO,
        }
    }
}

/// Core trait for upstream extraction.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Identifier for logs and readiness output.
    fn id(&self) -> &'static str;

    /// Fetch metadata and available formats for a single video.
    async fn video_info(&self, url: &str) -> MediaResult<RawVideo>;

    /// Fetch playlist metadata and its entries.
    async fn playlist_info(&self, url: &str) -> MediaResult<RawPlaylist>;

    /// Start streaming a rendition. Resolves once the first bytes are
    /// available, so a failure to start is reported here rather than
    /// mid-stream.
    async fn open_stream(&self, url: &str, selector: MediaSelector) -> MediaResult<MediaStream>;

    /// Check that the extraction tool is usable. Returns its version.
    async fn check_available(&self) -> MediaResult<String>;
}
