//! YouTube proxy service.
//!
//! Wraps the extractor, translates its failures through the per-operation
//! error rules, and normalizes raw upstream output into the response models.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use ytp_media::models::best_of;
use ytp_media::{Extractor, MediaSelector, MediaStream, RawFormat, RawPlaylist, RawPlaylistEntry, RawVideo};
use ytp_models::{
    attachment_filename, is_valid_video_id, playlist_url, rank_quality_options,
    select_audio_options, watch_url, AudioOption, PlaylistInfo, PlaylistVideoSummary,
    QualityOption, ThumbnailSet, ThumbnailUrls, VideoInfo, MAX_PLAYLIST_VIDEOS,
};

use crate::error::ApiResult;
use crate::error_rules::{self, ErrorRules};
use crate::metrics;

/// Author shown when the platform reports none.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// A media download ready to be sent as an attachment.
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub kind: &'static str,
    pub stream: MediaStream,
}

/// Per-kind download presentation.
struct DownloadKind {
    kind: &'static str,
    content_type: &'static str,
    extension: &'static str,
    fallback_name: &'static str,
    rules: ErrorRules,
}

const VIDEO_DOWNLOAD: DownloadKind = DownloadKind {
    kind: "video",
    content_type: "video/mp4",
    extension: "mp4",
    fallback_name: "video",
    rules: error_rules::VIDEO_DOWNLOAD,
};

const AUDIO_DOWNLOAD: DownloadKind = DownloadKind {
    kind: "audio",
    content_type: "audio/mpeg",
    extension: "mp3",
    fallback_name: "audio",
    rules: error_rules::AUDIO_DOWNLOAD,
};

/// Service backing the `/api/youtube/*` routes.
#[derive(Clone)]
pub struct YoutubeService {
    extractor: Arc<dyn Extractor>,
}

impl YoutubeService {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Resolve a validated video URL into normalized metadata.
    pub async fn video_info(&self, url: &str) -> ApiResult<VideoInfo> {
        let raw = self
            .extractor
            .video_info(url)
            .await
            .map_err(|e| error_rules::VIDEO_INFO.reject(&e))?;

        let info = build_video_info(raw);
        info!(
            video_id = %info.video_id,
            qualities = info.quality_options.len(),
            audio = info.audio_options.len(),
            "Resolved video info"
        );
        Ok(info)
    }

    /// Resolve a playlist by id. The upstream call only ever sees the
    /// canonical playlist URL.
    pub async fn playlist_info(&self, playlist_id: &str) -> ApiResult<PlaylistInfo> {
        let raw = self
            .extractor
            .playlist_info(&playlist_url(playlist_id))
            .await
            .map_err(|e| error_rules::PLAYLIST_INFO.reject(&e))?;

        let playlist = build_playlist_info(playlist_id, raw);
        info!(
            playlist_id = %playlist.playlist_id,
            videos = playlist.videos.len(),
            truncated = playlist.truncated,
            "Resolved playlist info"
        );
        Ok(playlist)
    }

    /// Resolve a validated video id into templated thumbnail URLs.
    pub async fn thumbnail_set(&self, video_id: &str) -> ApiResult<ThumbnailSet> {
        let raw = self
            .extractor
            .video_info(&watch_url(video_id))
            .await
            .map_err(|e| error_rules::THUMBNAIL.reject(&e))?;

        Ok(ThumbnailSet {
            video_id: video_id.to_string(),
            title: raw.title.clone().unwrap_or_default(),
            author: raw.author().unwrap_or(UNKNOWN_AUTHOR).to_string(),
            thumbnails: ThumbnailUrls::for_video(video_id),
        })
    }

    /// Resolve the title for the attachment filename, then start the
    /// upstream stream. Nothing is sent to the client until both succeed.
    pub async fn download(&self, url: &str, selector: MediaSelector) -> ApiResult<Download> {
        let kind = match selector {
            MediaSelector::Video { .. } => &VIDEO_DOWNLOAD,
            MediaSelector::Audio => &AUDIO_DOWNLOAD,
        };

        let raw = self
            .extractor
            .video_info(url)
            .await
            .map_err(|e| kind.rules.reject(&e))?;

        let title = raw.title.unwrap_or_default();
        let filename = attachment_filename(&title, kind.fallback_name, kind.extension);
        debug!(url = %url, filename = %filename, "Resolved download filename");

        let stream = self
            .extractor
            .open_stream(url, selector)
            .await
            .map_err(|e| kind.rules.reject(&e))?;

        metrics::record_stream_started(kind.kind);

        Ok(Download {
            filename,
            content_type: kind.content_type,
            kind: kind.kind,
            stream,
        })
    }

    /// Check the extractor and report its id and version.
    pub async fn check_extractor(&self) -> (&'static str, Result<String, String>) {
        let id = self.extractor.id();
        let result = self
            .extractor
            .check_available()
            .await
            .map_err(|e| e.to_string());
        (id, result)
    }
}

/// Normalize raw upstream metadata.
pub fn build_video_info(raw: RawVideo) -> VideoInfo {
    let quality_options = rank_quality_options(raw.formats.iter().filter_map(quality_option));
    let audio_options = select_audio_options(raw.formats.iter().filter_map(audio_option));

    VideoInfo {
        author: raw.author().unwrap_or(UNKNOWN_AUTHOR).to_string(),
        channel_url: raw.author_url().map(str::to_string),
        thumbnail: raw.best_thumbnail().map(str::to_string),
        duration: raw.duration.map(whole_seconds).unwrap_or(0),
        views: raw.view_count.unwrap_or(0),
        likes: raw.like_count,
        upload_date: raw.upload_date.as_deref().map(format_upload_date),
        video_id: raw.id,
        title: raw.title.unwrap_or_default(),
        description: raw.description,
        quality_options,
        audio_options,
    }
}

fn quality_option(format: &RawFormat) -> Option<QualityOption> {
    if !format.has_video() {
        return None;
    }

    Some(QualityOption {
        quality: video_label(format)?,
        itag: format.format_id.clone(),
        container: format.ext.clone().unwrap_or_else(|| "mp4".to_string()),
        size: format.size(),
        fps: format.fps.map(|fps| fps.round() as u32),
        bitrate: format.tbr.map(|kbps| (kbps * 1000.0).round() as u64),
    })
}

fn audio_option(format: &RawFormat) -> Option<AudioOption> {
    if !format.has_audio() || format.has_video() {
        return None;
    }

    let kbps = format.abr.or(format.tbr)?.round() as u32;
    Some(AudioOption {
        quality: AudioOption::label_for(kbps),
        itag: format.format_id.clone(),
        container: format.ext.clone().unwrap_or_else(|| "m4a".to_string()),
        size: format.size(),
        bitrate: kbps,
    })
}

/// Quality label for a video format: the platform's `1080p`-style note when
/// present, else one derived from the frame height.
fn video_label(format: &RawFormat) -> Option<String> {
    let from_note = format
        .format_note
        .as_deref()
        .and_then(|note| note.split_whitespace().next())
        .filter(|token| is_resolution_label(token));

    match from_note {
        Some(token) => Some(token.to_string()),
        None => format.height.map(|h| format!("{}p", h)),
    }
}

/// `<digits>p` optionally followed by a frame rate, e.g. `720p` or `1080p60`.
fn is_resolution_label(token: &str) -> bool {
    let Some((height, rate)) = token.split_once('p') else {
        return false;
    };
    !height.is_empty()
        && height.chars().all(|c| c.is_ascii_digit())
        && rate.chars().all(|c| c.is_ascii_digit())
}

fn whole_seconds(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs.round() as u64
    } else {
        0
    }
}

/// `YYYYMMDD` to `YYYY-MM-DD`; anything else is passed through.
fn format_upload_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Normalize a raw playlist, keeping at most [`MAX_PLAYLIST_VIDEOS`] entries.
///
/// The extractor fetches only a bounded prefix of the playlist, so the
/// upstream reported count is preferred over the number of entries.
pub fn build_playlist_info(playlist_id: &str, raw: RawPlaylist) -> PlaylistInfo {
    let total = raw.playlist_count.unwrap_or(raw.entries.len() as u64);
    let truncated = raw.entries.len() > MAX_PLAYLIST_VIDEOS || total > MAX_PLAYLIST_VIDEOS as u64;

    let videos: Vec<PlaylistVideoSummary> = raw
        .entries
        .into_iter()
        .take(MAX_PLAYLIST_VIDEOS)
        .enumerate()
        .filter_map(|(index, entry)| match summarize_entry(entry) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(playlist_id = %playlist_id, index, error = %e, "Skipping playlist entry");
                metrics::record_playlist_entry_skipped();
                None
            }
        })
        .collect();

    let thumbnail = best_of(&raw.thumbnails)
        .map(str::to_string)
        .or_else(|| videos.first().map(|v| v.thumbnail.clone()));

    PlaylistInfo {
        playlist_id: playlist_id.to_string(),
        title: raw.title.unwrap_or_default(),
        author: raw
            .uploader
            .or(raw.channel)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        thumbnail,
        video_count: total,
        truncated,
        videos,
    }
}

fn summarize_entry(entry: serde_json::Value) -> anyhow::Result<PlaylistVideoSummary> {
    let entry: RawPlaylistEntry =
        serde_json::from_value(entry).context("malformed playlist entry")?;

    if !is_valid_video_id(&entry.id) {
        bail!("invalid video id {:?}", entry.id);
    }

    let thumbnail = best_of(&entry.thumbnails)
        .map(str::to_string)
        .unwrap_or_else(|| PlaylistVideoSummary::default_thumbnail(&entry.id));

    Ok(PlaylistVideoSummary {
        author: entry.author().map(str::to_string),
        duration: entry.duration.map(whole_seconds),
        title: entry.title.unwrap_or_default(),
        thumbnail,
        video_id: entry.id,
    })
}
