//! Application state.

use std::sync::Arc;

use ytp_media::Extractor;

use crate::config::ApiConfig;
use crate::services::YoutubeService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub youtube: YoutubeService,
}

impl AppState {
    /// Create new application state around an extractor.
    pub fn new(config: ApiConfig, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            config,
            youtube: YoutubeService::new(extractor),
        }
    }
}
