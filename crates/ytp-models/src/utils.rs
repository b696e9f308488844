//! URL parsing and validation helpers shared by the proxy crates.
//!
//! The proxy only ever talks to YouTube, so these helpers encode the
//! platform's URL shapes and its 11-character video identifier grammar.

use thiserror::Error;
use url::Url;

/// Length of a YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;

/// Hosts accepted as YouTube video URLs.
const VALID_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Hosts that carry the video id as the first path segment.
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes that carry the video id as the following segment.
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live", "e"];

/// Errors that can occur during YouTube ID extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YoutubeIdError {
    /// URL is not a valid YouTube URL
    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,
    /// Video ID has invalid format
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    /// Video ID not found in URL
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Result type for YouTube ID extraction.
pub type YoutubeIdResult<T> = Result<T, YoutubeIdError>;

/// Extract the video ID from a YouTube URL.
///
/// Supported shapes:
/// - https://www.youtube.com/watch?v=VIDEO_ID
/// - https://youtu.be/VIDEO_ID
/// - https://www.youtube.com/embed/VIDEO_ID
/// - https://www.youtube.com/v/VIDEO_ID
/// - https://www.youtube.com/shorts/VIDEO_ID
/// - https://www.youtube.com/live/VIDEO_ID
pub fn extract_youtube_id(url: &str) -> YoutubeIdResult<String> {
    let parsed = Url::parse(url.trim()).map_err(|_| YoutubeIdError::InvalidYoutubeUrl)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(YoutubeIdError::InvalidYoutubeUrl)?;

    let mut segments = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
        segments.next().map(str::to_string)
    } else if VALID_HOSTS.contains(&host.as_str()) {
        let from_query = parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned());

        match from_query {
            Some(id) => Some(id),
            None => match segments.next() {
                Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            },
        }
    } else {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    };

    let id = candidate.ok_or(YoutubeIdError::VideoIdNotFound)?;
    if !is_valid_video_id(id.trim()) {
        return Err(YoutubeIdError::InvalidVideoId);
    }
    Ok(id.trim().to_string())
}

/// The platform's URL-validity predicate: a YouTube host carrying a
/// well-formed video id.
pub fn is_valid_youtube_url(url: &str) -> bool {
    extract_youtube_id(url).is_ok()
}

/// Check an identifier against the 11-character grammar
/// (ASCII alphanumerics plus `-` and `_`).
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Canonical playlist URL for a playlist id.
pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={}", playlist_id)
}

/// Reduce a title to a filesystem-safe token by dropping every character
/// outside `[A-Za-z0-9]`.
pub fn sanitize_filename_token(title: &str) -> String {
    title.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Build an attachment filename from a title, falling back when the title
/// has no usable characters.
pub fn attachment_filename(title: &str, fallback: &str, extension: &str) -> String {
    let token = sanitize_filename_token(title);
    let stem = if token.is_empty() { fallback } else { token.as_str() };
    format!("{}.{}", stem, extension)
}
