//! Error types for upstream extraction.

use thiserror::Error;

/// Result type for extraction operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors raised while talking to the upstream extraction tool.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found")]
    YtDlpNotFound,

    #[error("yt-dlp failed: {message}")]
    ExtractionFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Media stream produced no data: {message}")]
    EmptyStream { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Build an extraction failure from a finished process's stderr.
    pub fn extraction_failed(stderr: &str, exit_code: Option<i32>) -> Self {
        Self::ExtractionFailed {
            message: error_line(stderr),
            stderr: Some(stderr.to_string()),
            exit_code,
        }
    }

    /// The raw upstream diagnostic, suitable for substring classification
    /// and for the `message` field of an error response.
    pub fn upstream_message(&self) -> String {
        match self {
            MediaError::ExtractionFailed { message, .. } => message.clone(),
            MediaError::EmptyStream { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Pick the most relevant line from yt-dlp stderr: the last `ERROR:` line,
/// else the last non-empty line.
pub fn error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "Unknown error".to_string())
}
