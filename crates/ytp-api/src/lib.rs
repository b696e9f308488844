//! Axum HTTP proxy for YouTube metadata and media.
//!
//! This crate provides:
//! - Video, playlist and thumbnail metadata endpoints
//! - Streaming video and audio downloads
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod error_rules;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::YoutubeService;
pub use state::AppState;
