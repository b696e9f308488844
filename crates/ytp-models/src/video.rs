//! Video metadata and rendition option models.

use serde::{Deserialize, Serialize};

/// Fixed quality ranking, best first. Labels not listed here are unranked
/// and sort after every ranked label.
pub const QUALITY_RANK: &[&str] = &["2160p", "1440p", "1080p", "720p", "480p", "360p"];

/// Maximum number of audio options returned.
pub const MAX_AUDIO_OPTIONS: usize = 3;

/// Normalized video metadata returned by the info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub channel_url: Option<String>,
    /// Best available thumbnail URL
    pub thumbnail: Option<String>,
    /// Duration in whole seconds
    pub duration: u64,
    pub views: u64,
    pub likes: Option<u64>,
    pub description: Option<String>,
    /// Upload date as `YYYY-MM-DD` when known
    pub upload_date: Option<String>,
    pub quality_options: Vec<QualityOption>,
    pub audio_options: Vec<AudioOption>,
}

/// A video rendition the caller can request for download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityOption {
    /// Quality label, e.g. `1080p`
    pub quality: String,
    /// Opaque upstream format selector
    pub itag: String,
    /// Container format, e.g. `mp4`
    pub container: String,
    /// Size in bytes, when the platform reports it
    pub size: Option<u64>,
    pub fps: Option<u32>,
    /// Bitrate in bits per second
    pub bitrate: Option<u64>,
}

/// An audio-only rendition the caller can request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioOption {
    /// Label derived from bitrate, e.g. `128kbps`
    pub quality: String,
    pub itag: String,
    pub container: String,
    pub size: Option<u64>,
    /// Bitrate in kbps
    pub bitrate: u32,
}

impl AudioOption {
    /// Label for a bitrate in kbps.
    pub fn label_for(bitrate_kbps: u32) -> String {
        format!("{}kbps", bitrate_kbps)
    }
}

/// Position of a label in [`QUALITY_RANK`].
///
/// Frame-rate suffixed labels (`1080p60`) rank with their base resolution.
pub fn quality_rank(label: &str) -> Option<usize> {
    let base = match label.find('p') {
        Some(idx) => &label[..=idx],
        None => label,
    };
    QUALITY_RANK.iter().position(|q| *q == base)
}

/// Deduplicate by label (first seen wins) and order by the quality rank,
/// best first. Unranked labels keep their relative order at the end.
pub fn rank_quality_options(options: impl IntoIterator<Item = QualityOption>) -> Vec<QualityOption> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<QualityOption> = options
        .into_iter()
        .filter(|opt| seen.insert(opt.quality.clone()))
        .collect();

    unique.sort_by_key(|opt| quality_rank(&opt.quality).unwrap_or(QUALITY_RANK.len()));
    unique
}

/// Order audio options by descending bitrate and keep the top
/// [`MAX_AUDIO_OPTIONS`].
pub fn select_audio_options(options: impl IntoIterator<Item = AudioOption>) -> Vec<AudioOption> {
    let mut options: Vec<AudioOption> = options.into_iter().collect();
    options.sort_by(|a, b| b.bitrate.cmp(&a.bitrate));
    options.truncate(MAX_AUDIO_OPTIONS);
    options
}
