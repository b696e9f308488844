//! Playlist models.

use serde::{Deserialize, Serialize};

/// Maximum number of playlist entries returned per request.
pub const MAX_PLAYLIST_VIDEOS: usize = 50;

/// Normalized playlist metadata returned by the playlist endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    pub playlist_id: String,
    pub title: String,
    pub author: String,
    pub thumbnail: Option<String>,
    /// Number of videos the platform reports for the playlist
    pub video_count: u64,
    /// Set when the platform returned more than [`MAX_PLAYLIST_VIDEOS`] entries
    pub truncated: bool,
    pub videos: Vec<PlaylistVideoSummary>,
}

/// One member video of a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoSummary {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    /// Duration in whole seconds, when known
    pub duration: Option<u64>,
    pub author: Option<String>,
}

impl PlaylistVideoSummary {
    /// Thumbnail used when the platform lists none for an entry.
    pub fn default_thumbnail(video_id: &str) -> String {
        format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
    }
}
