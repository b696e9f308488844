//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::ApiError;
use crate::handlers::{
    download_audio, download_video, health, playlist_info, ready, thumbnail, video_info,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let youtube_routes = Router::new()
        // Metadata
        .route("/info", post(video_info))
        .route("/playlist", post(playlist_info))
        .route("/thumbnail", post(thumbnail))
        // Streaming downloads
        .route("/download", get(download_video))
        .route("/download-audio", get(download_audio));

    // Rate limiting is disabled with RATE_LIMIT_RPS=0
    let youtube_routes = if state.config.rate_limit_rps > 0 {
        let rate_limiter = Arc::new(
            RateLimiterCache::new(state.config.rate_limit_rps)
                .with_trusted_proxy_headers(state.config.trust_proxy_headers),
        );
        youtube_routes.layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
    } else {
        youtube_routes
    };

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api/youtube", youtube_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .fallback(not_found)
        // SECURITY: Request body size limit to prevent DoS attacks
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
