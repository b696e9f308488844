//! Translation of upstream failures into user-facing messages.
//!
//! Each operation has an ordered rule table. The first rule with a needle
//! contained in the upstream message (case-insensitive) wins; otherwise the
//! table's default applies. All assumptions about the extraction tool's
//! error wording live here.

use tracing::warn;
use ytp_media::MediaError;

use crate::error::ApiError;
use crate::metrics;

/// One `(predicate, user message)` pair. The predicate matches when any
/// needle is a substring of the lowercased upstream message.
#[derive(Debug, Clone, Copy)]
pub struct ErrorRule {
    pub needles: &'static [&'static str],
    pub message: &'static str,
}

impl ErrorRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.needles.iter().any(|needle| lowered.contains(needle))
    }
}

/// Ordered rule table for one operation.
#[derive(Debug, Clone, Copy)]
pub struct ErrorRules {
    pub operation: &'static str,
    pub rules: &'static [ErrorRule],
    pub default: &'static str,
}

impl ErrorRules {
    /// Pick the user-facing message for a raw upstream message.
    pub fn classify(&self, raw: &str) -> &'static str {
        let lowered = raw.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.message)
            .unwrap_or(self.default)
    }

    /// Convert an upstream failure into an API error, keeping the raw
    /// diagnostic in the `message` field.
    pub fn reject(&self, err: &MediaError) -> ApiError {
        let raw = err.upstream_message();
        let message = self.classify(&raw);
        warn!(operation = self.operation, error = message, upstream = %raw, "Upstream call failed");
        metrics::record_upstream_failure(self.operation, message);
        ApiError::upstream(message, raw)
    }
}

const VIDEO_RULES: &[ErrorRule] = &[
    ErrorRule {
        needles: &["status code: 410", "http error 410"],
        message: "This video is no longer available",
    },
    ErrorRule {
        needles: &["private video"],
        message: "This video is private",
    },
    ErrorRule {
        needles: &[
            "age-restricted",
            "age restricted",
            "confirm your age",
            "inappropriate for some users",
        ],
        message: "Age-restricted videos are not supported",
    },
    ErrorRule {
        needles: &["unavailable"],
        message: "This video is unavailable in your region",
    },
];

pub const VIDEO_INFO: ErrorRules = ErrorRules {
    operation: "video_info",
    rules: VIDEO_RULES,
    default: "Failed to fetch video information",
};

pub const VIDEO_DOWNLOAD: ErrorRules = ErrorRules {
    operation: "video_download",
    rules: VIDEO_RULES,
    default: "Failed to download video",
};

pub const AUDIO_DOWNLOAD: ErrorRules = ErrorRules {
    operation: "audio_download",
    rules: VIDEO_RULES,
    default: "Failed to download audio",
};

pub const PLAYLIST_INFO: ErrorRules = ErrorRules {
    operation: "playlist_info",
    rules: &[
        ErrorRule {
            needles: &["private"],
            message: "This playlist is private",
        },
        ErrorRule {
            needles: &["unavailable", "does not exist"],
            message: "This playlist is unavailable",
        },
    ],
    default: "Failed to fetch playlist information",
};

pub const THUMBNAIL: ErrorRules = ErrorRules {
    operation: "thumbnail",
    rules: &[
        ErrorRule {
            needles: &["video unavailable"],
            message: "Video not found or unavailable",
        },
        ErrorRule {
            needles: &["private"],
            message: "This video is private",
        },
    ],
    default: "Failed to fetch thumbnail information",
};
