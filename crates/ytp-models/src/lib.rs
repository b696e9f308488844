//! Shared data models for the YouTube proxy.
//!
//! This crate provides Serde-serializable types for:
//! - Video metadata with ranked quality and audio options
//! - Playlist summaries
//! - Thumbnail sets
//! - YouTube URL and video ID validation

pub mod playlist;
pub mod thumbnail;
pub mod utils;
pub mod video;

// Re-export common types
pub use playlist::{PlaylistInfo, PlaylistVideoSummary, MAX_PLAYLIST_VIDEOS};
pub use thumbnail::{ThumbnailSet, ThumbnailUrls};
pub use utils::{
    attachment_filename, extract_youtube_id, is_valid_video_id, is_valid_youtube_url,
    playlist_url, sanitize_filename_token, watch_url, YoutubeIdError, YoutubeIdResult,
};
pub use video::{
    quality_rank, rank_quality_options, select_audio_options, AudioOption, QualityOption,
    VideoInfo, MAX_AUDIO_OPTIONS, QUALITY_RANK,
};
