//! YouTube proxy handlers.

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use ytp_media::MediaSelector;
use ytp_models::{PlaylistInfo, ThumbnailSet, VideoInfo};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{extract_playlist_id, validate_video_id, validate_video_url};
use crate::services::Download;
use crate::state::AppState;

/// Body of the info and playlist requests.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: Option<String>,
}

/// Body of the thumbnail request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRequest {
    pub video_id: Option<String>,
}

/// Query of the download endpoints.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    /// Upstream format selector; only honoured for video downloads.
    pub quality: Option<String>,
}

/// Success envelope: `{success: true, ...data}`.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> SuccessResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Get video metadata with ranked quality and audio options.
pub async fn video_info(
    State(state): State<AppState>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse<VideoInfo>>> {
    let Json(request) = body?;
    let url = validate_video_url(request.url.as_deref())?;

    let info = state.youtube.video_info(&url).await?;
    Ok(SuccessResponse::ok(info))
}

/// Get playlist metadata and its first videos.
pub async fn playlist_info(
    State(state): State<AppState>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse<PlaylistInfo>>> {
    let Json(request) = body?;
    let playlist_id = extract_playlist_id(request.url.as_deref())?;

    let playlist = state.youtube.playlist_info(&playlist_id).await?;
    Ok(SuccessResponse::ok(playlist))
}

/// Get the templated thumbnail set for a video id.
pub async fn thumbnail(
    State(state): State<AppState>,
    body: Result<Json<ThumbnailRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse<ThumbnailSet>>> {
    let Json(request) = body?;
    let video_id = validate_video_id(request.video_id.as_deref())?;

    let thumbnails = state.youtube.thumbnail_set(&video_id).await?;
    Ok(SuccessResponse::ok(thumbnails))
}

/// Stream a video rendition as an `.mp4` attachment.
pub async fn download_video(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let url = validate_video_url(query.url.as_deref())?;

    let download = state
        .youtube
        .download(&url, MediaSelector::video(query.quality))
        .await?;
    attachment_response(download)
}

/// Stream the best audio rendition as an `.mp3` attachment.
pub async fn download_audio(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let url = validate_video_url(query.url.as_deref())?;

    let download = state.youtube.download(&url, MediaSelector::Audio).await?;
    attachment_response(download)
}

/// Build the streaming response. Once this returns, failures can only
/// truncate the body.
fn attachment_response(download: Download) -> ApiResult<Response> {
    let Download {
        filename,
        content_type,
        kind,
        stream,
    } = download;

    info!(kind, filename = %filename, "Streaming download");

    let stream = stream
        .inspect_ok(move |chunk| metrics::record_stream_bytes(kind, chunk.len() as u64))
        .inspect_err(move |e| {
            error!(kind, error = %e, "Download stream failed mid-transfer");
            metrics::record_stream_error(kind);
        });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
