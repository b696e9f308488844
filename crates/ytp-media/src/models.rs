//! Raw data shapes returned by the upstream extraction tool.
//!
//! These mirror the subset of yt-dlp's JSON output the proxy reads. Every
//! field the platform may omit is optional so that a sparse response still
//! deserializes.

use serde::{Deserialize, Serialize};

/// Single video metadata as reported upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVideo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,
    /// Available renditions, best first.
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

impl RawVideo {
    /// Display name of the uploading channel.
    pub fn author(&self) -> Option<&str> {
        self.uploader.as_deref().or(self.channel.as_deref())
    }

    /// Link to the uploading channel.
    pub fn author_url(&self) -> Option<&str> {
        self.channel_url.as_deref().or(self.uploader_url.as_deref())
    }

    /// Best available thumbnail: the explicit pick, else the largest listed.
    pub fn best_thumbnail(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .or_else(|| best_of(&self.thumbnails))
    }
}

/// One encoded rendition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFormat {
    /// Opaque selector token (YouTube itag)
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    /// Total bitrate in kbps
    #[serde(default)]
    pub tbr: Option<f64>,
    /// Audio bitrate in kbps
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

impl RawFormat {
    pub fn has_video(&self) -> bool {
        codec_present(self.vcodec.as_deref())
    }

    pub fn has_audio(&self) -> bool {
        codec_present(self.acodec.as_deref())
    }

    /// Byte size, exact if known, otherwise the upstream estimate.
    pub fn size(&self) -> Option<u64> {
        self.filesize
            .or_else(|| self.filesize_approx.map(|s| s.round() as u64))
    }
}

fn codec_present(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != "none")
}

/// Thumbnail entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawThumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Largest thumbnail by pixel area; later entries win ties.
pub fn best_of(thumbnails: &[RawThumbnail]) -> Option<&str> {
    thumbnails
        .iter()
        .max_by_key(|t| t.width.unwrap_or(0) as u64 * t.height.unwrap_or(0) as u64)
        .map(|t| t.url.as_str())
}

/// Playlist metadata with unparsed entries.
///
/// Entries are kept as raw JSON so that one malformed item does not fail
/// the whole playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlaylist {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub playlist_count: Option<u64>,
    #[serde(default)]
    pub entries: Vec<serde_json::Value>,
}

impl RawPlaylist {
    pub fn author(&self) -> Option<&str> {
        self.uploader.as_deref().or(self.channel.as_deref())
    }
}

/// Flat playlist entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlaylistEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl RawPlaylistEntry {
    pub fn author(&self) -> Option<&str> {
        self.uploader.as_deref().or(self.channel.as_deref())
    }
}
