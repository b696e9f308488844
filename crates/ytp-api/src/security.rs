//! Input validation for untrusted request fields.
//!
//! Every check here runs before the extractor is touched, so malformed
//! input never costs an upstream call.

use std::sync::LazyLock;

use regex::Regex;
use ytp_models::{is_valid_video_id, is_valid_youtube_url};

use crate::error::{ApiError, ApiResult};

/// Maximum URL length to prevent DoS attacks.
const MAX_URL_LENGTH: usize = 2048;

pub const URL_REQUIRED: &str = "URL is required";
pub const INVALID_YOUTUBE_URL: &str = "Invalid YouTube URL";
pub const INVALID_PLAYLIST_URL: &str =
    "Invalid YouTube playlist URL. Must contain \"list=\" parameter.";
pub const PLAYLIST_ID_NOT_FOUND: &str = "Could not extract playlist ID";
pub const VIDEO_ID_REQUIRED: &str = "Video ID is required";
pub const INVALID_VIDEO_ID: &str = "Invalid YouTube Video ID format";

/// Playlist id carried in a `list` query parameter.
static PLAYLIST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").expect("playlist id pattern is valid")
});

/// Trim a required field, treating blank as missing.
fn required<'a>(value: Option<&'a str>, missing: &str) -> ApiResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(missing)),
    }
}

/// Validate a video URL against the platform's validity predicate.
pub fn validate_video_url(url: Option<&str>) -> ApiResult<String> {
    let url = required(url, URL_REQUIRED)?;

    if url.len() > MAX_URL_LENGTH || !is_valid_youtube_url(url) {
        return Err(ApiError::bad_request(INVALID_YOUTUBE_URL));
    }

    Ok(url.to_string())
}

/// Extract the playlist id from a playlist URL.
pub fn extract_playlist_id(url: Option<&str>) -> ApiResult<String> {
    let url = required(url, URL_REQUIRED)?;

    if url.len() > MAX_URL_LENGTH || !url.contains("list=") {
        return Err(ApiError::bad_request(INVALID_PLAYLIST_URL));
    }

    PLAYLIST_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ApiError::bad_request(PLAYLIST_ID_NOT_FOUND))
}

/// Validate a bare video id against the 11-character grammar.
pub fn validate_video_id(video_id: Option<&str>) -> ApiResult<String> {
    let video_id = required(video_id, VIDEO_ID_REQUIRED)?;

    if !is_valid_video_id(video_id) {
        return Err(ApiError::bad_request(INVALID_VIDEO_ID));
    }

    Ok(video_id.to_string())
}
