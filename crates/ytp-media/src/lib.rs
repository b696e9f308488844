//! Upstream extraction for the YouTube proxy.
//!
//! This crate provides:
//! - The [`Extractor`] trait that isolates the server from the extraction tool
//! - Raw upstream data shapes
//! - A yt-dlp backed implementation with cancellable media streaming

pub mod error;
pub mod extractor;
pub mod models;
pub mod ytdlp;

pub use error::{MediaError, MediaResult};
pub use extractor::{Extractor, MediaSelector, MediaStream};
pub use models::{RawFormat, RawPlaylist, RawPlaylistEntry, RawThumbnail, RawVideo};
pub use ytdlp::{ExtractorConfig, YtDlpExtractor, DEFAULT_USER_AGENT};
