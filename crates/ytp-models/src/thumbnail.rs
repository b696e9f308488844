//! Thumbnail URL templating.
//!
//! Thumbnail URLs are a pure function of the video id. The `maxres` entry is
//! a best-effort guess: the platform does not generate it for every video.

use serde::{Deserialize, Serialize};

/// Thumbnail set returned by the thumbnail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailSet {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub thumbnails: ThumbnailUrls,
}

/// Fixed resolution-name to URL map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThumbnailUrls {
    pub maxres: String,
    pub standard: String,
    pub high: String,
    pub medium: String,
    pub default: String,
}

impl ThumbnailUrls {
    /// Build every thumbnail URL for a video id.
    pub fn for_video(video_id: &str) -> Self {
        let url = |file: &str| format!("https://img.youtube.com/vi/{}/{}.jpg", video_id, file);
        Self {
            maxres: url("maxresdefault"),
            standard: url("sddefault"),
            high: url("hqdefault"),
            medium: url("mqdefault"),
            default: url("default"),
        }
    }
}
