//! API integration tests.
//!
//! The router runs against a mocked extractor, so no yt-dlp binary or
//! network access is needed.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use futures_util::stream;
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;

use ytp_api::{create_router, ApiConfig, AppState};
use ytp_media::{
    Extractor, MediaError, MediaResult, MediaSelector, MediaStream, RawFormat, RawPlaylist,
    RawVideo,
};

mock! {
    pub Extractor {}

    #[async_trait]
    impl Extractor for Extractor {
        fn id(&self) -> &'static str;
        async fn video_info(&self, url: &str) -> MediaResult<RawVideo>;
        async fn playlist_info(&self, url: &str) -> MediaResult<RawPlaylist>;
        async fn open_stream(&self, url: &str, selector: MediaSelector) -> MediaResult<MediaStream>;
        async fn check_available(&self) -> MediaResult<String>;
    }
}

const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const WATCH_URL_ENCODED: &str = "https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ";

fn create_test_router(extractor: MockExtractor) -> Router {
    let config = ApiConfig {
        rate_limit_rps: 0,
        ..ApiConfig::default()
    };
    create_router(AppState::new(config, Arc::new(extractor)), None)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn video_format(id: &str, note: &str, height: u32) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        ext: Some("mp4".to_string()),
        height: Some(height),
        format_note: Some(note.to_string()),
        vcodec: Some("avc1.640028".to_string()),
        acodec: Some("none".to_string()),
        ..Default::default()
    }
}

fn audio_format(id: &str, abr: f64) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        ext: Some("m4a".to_string()),
        abr: Some(abr),
        vcodec: Some("none".to_string()),
        acodec: Some("mp4a.40.2".to_string()),
        ..Default::default()
    }
}

fn sample_video() -> RawVideo {
    RawVideo {
        id: "dQw4w9WgXcQ".to_string(),
        title: Some("Never Gonna Give You Up!".to_string()),
        uploader: Some("Rick Astley".to_string()),
        duration: Some(212.0),
        view_count: Some(1_000),
        upload_date: Some("20091025".to_string()),
        formats: vec![
            video_format("137", "1080p", 1080),
            video_format("22", "720p", 720),
            video_format("136", "720p", 720),
            video_format("18", "360p", 360),
            audio_format("251", 160.0),
            audio_format("140", 128.0),
            audio_format("250", 70.0),
            audio_format("249", 50.0),
        ],
        ..Default::default()
    }
}

fn byte_stream(chunks: &[&'static str]) -> MediaStream {
    let chunks: Vec<std::io::Result<Bytes>> = chunks
        .iter()
        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
        .collect();
    Box::pin(stream::iter(chunks))
}

/// Test health endpoint.
#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(MockExtractor::new());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-Request-ID"));
    assert_eq!(
        response.headers().get("Cross-Origin-Resource-Policy").unwrap(),
        "cross-origin"
    );
    assert_eq!(
        json_body(response).await,
        json!({"status": "ok", "message": "YouTube Proxy Server is running"})
    );
}

#[tokio::test]
async fn test_ready_reports_extractor_version() {
    let mut extractor = MockExtractor::new();
    extractor.expect_id().return_const("yt-dlp");
    extractor
        .expect_check_available()
        .returning(|| Ok("2024.10.07".to_string()));

    let response = create_test_router(extractor).oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["extractor"]["version"], "2024.10.07");
    assert!(body["checks"]["extractor"]["latencyMs"].is_u64());
}

#[tokio::test]
async fn test_ready_degraded_without_tool() {
    let mut extractor = MockExtractor::new();
    extractor.expect_id().return_const("yt-dlp");
    extractor
        .expect_check_available()
        .returning(|| Err(MediaError::YtDlpNotFound));

    let response = create_test_router(extractor).oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["extractor"]["status"], "error");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = create_test_router(MockExtractor::new())
        .oneshot(get("/api/youtube/nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_info_rejects_invalid_url_without_upstream_call() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().never();

    let response = create_test_router(extractor)
        .oneshot(post_json("/api/youtube/info", json!({"url": "not a url"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Invalid YouTube URL"}));
}

#[tokio::test]
async fn test_info_requires_url() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().never();

    let response = create_test_router(extractor)
        .oneshot(post_json("/api/youtube/info", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "URL is required");
}

#[tokio::test]
async fn test_info_rejects_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/youtube/info")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = create_test_router(MockExtractor::new())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_info_success() {
    let mut extractor = MockExtractor::new();
    extractor
        .expect_video_info()
        .withf(|url| url == WATCH_URL)
        .times(1)
        .returning(|_| Ok(sample_video()));

    let response = create_test_router(extractor)
        .oneshot(post_json("/api/youtube/info", json!({"url": WATCH_URL})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["videoId"], "dQw4w9WgXcQ");
    assert_eq!(body["author"], "Rick Astley");
    assert_eq!(body["uploadDate"], "2009-10-25");

    let qualities: Vec<&str> = body["qualityOptions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["quality"].as_str().unwrap())
        .collect();
    assert_eq!(qualities, vec!["1080p", "720p", "360p"]);
    // First 720p rendition wins
    assert_eq!(body["qualityOptions"][1]["itag"], "22");

    let audio = body["audioOptions"].as_array().unwrap();
    assert_eq!(audio.len(), 3);
    assert_eq!(audio[0]["quality"], "160kbps");
    assert_eq!(audio[2]["quality"], "70kbps");
}

#[tokio::test]
async fn test_info_maps_upstream_failure() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().returning(|_| {
        Err(MediaError::extraction_failed(
            "ERROR: [youtube] dQw4w9WgXcQ: Private video. Sign in if you've been granted access",
            Some(1),
        ))
    });

    let response = create_test_router(extractor)
        .oneshot(post_json("/api/youtube/info", json!({"url": WATCH_URL})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "This video is private");
    assert!(body["message"].as_str().unwrap().contains("Private video"));
}

#[tokio::test]
async fn test_playlist_rejects_url_without_list() {
    let mut extractor = MockExtractor::new();
    extractor.expect_playlist_info().never();

    let response = create_test_router(extractor)
        .oneshot(post_json("/api/youtube/playlist", json!({"url": WATCH_URL})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid YouTube playlist URL. Must contain \"list=\" parameter."
    );
}

#[tokio::test]
async fn test_playlist_rejects_unextractable_id() {
    let response = create_test_router(MockExtractor::new())
        .oneshot(post_json(
            "/api/youtube/playlist",
            json!({"url": "https://www.youtube.com/playlist?list="}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Could not extract playlist ID");
}

#[tokio::test]
async fn test_playlist_truncates_and_skips_bad_entries() {
    let mut extractor = MockExtractor::new();
    extractor
        .expect_playlist_info()
        .withf(|url| url == "https://www.youtube.com/playlist?list=PLabc_123")
        .times(1)
        .returning(|_| {
            let mut entries = vec![json!({"id": 42})];
            entries.extend((0..60).map(|i| json!({"id": format!("video{:06}", i), "title": format!("Track {}", i)})));
            Ok(RawPlaylist {
                id: "PLabc_123".to_string(),
                title: Some("Favourites".to_string()),
                channel: Some("Someone".to_string()),
                entries,
                ..Default::default()
            })
        });

    let response = create_test_router(extractor)
        .oneshot(post_json(
            "/api/youtube/playlist",
            json!({"url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc_123&index=3"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["playlistId"], "PLabc_123");
    assert_eq!(body["author"], "Someone");
    assert_eq!(body["videoCount"], 61);
    assert_eq!(body["truncated"], true);

    let videos = body["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 49);
    assert_eq!(videos[0]["videoId"], "video000000");
    assert_eq!(
        videos[0]["thumbnail"],
        "https://i.ytimg.com/vi/video000000/hqdefault.jpg"
    );
}

#[tokio::test]
async fn test_playlist_maps_private_failure() {
    let mut extractor = MockExtractor::new();
    extractor
        .expect_playlist_info()
        .returning(|_| Err(MediaError::extraction_failed("ERROR: [youtube:tab] This playlist is private", Some(1))));

    let response = create_test_router(extractor)
        .oneshot(post_json(
            "/api/youtube/playlist",
            json!({"url": "https://www.youtube.com/playlist?list=PLabc"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "This playlist is private");
}

#[tokio::test]
async fn test_thumbnail_rejects_bad_video_id() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().never();

    let response = create_test_router(extractor)
        .oneshot(post_json("/api/youtube/thumbnail", json!({"videoId": "short"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid YouTube Video ID format");
}

#[tokio::test]
async fn test_thumbnail_is_deterministic() {
    let mut extractor = MockExtractor::new();
    extractor
        .expect_video_info()
        .withf(|url| url == WATCH_URL)
        .times(2)
        .returning(|_| Ok(sample_video()));
    let app = create_test_router(extractor);

    let first = app
        .clone()
        .oneshot(post_json("/api/youtube/thumbnail", json!({"videoId": "dQw4w9WgXcQ"})))
        .await
        .unwrap();
    let second = app
        .oneshot(post_json("/api/youtube/thumbnail", json!({"videoId": "dQw4w9WgXcQ"})))
        .await
        .unwrap();

    let first = json_body(first).await;
    assert_eq!(first, json_body(second).await);
    assert_eq!(first["title"], "Never Gonna Give You Up!");
    assert_eq!(
        first["thumbnails"]["maxres"],
        "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
    );
    assert_eq!(
        first["thumbnails"]["default"],
        "https://img.youtube.com/vi/dQw4w9WgXcQ/default.jpg"
    );
}

#[tokio::test]
async fn test_download_streams_video_attachment() {
    let mut extractor = MockExtractor::new();
    extractor
        .expect_video_info()
        .times(1)
        .returning(|_| Ok(sample_video()));
    extractor
        .expect_open_stream()
        .withf(|url, selector| url == WATCH_URL && *selector == MediaSelector::Video { format: None })
        .times(1)
        .returning(|_, _| Ok(byte_stream(&["abc", "def"])));

    let response = create_test_router(extractor)
        .oneshot(get(&format!("/api/youtube/download?url={}", WATCH_URL_ENCODED)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "video/mp4");
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"NeverGonnaGiveYouUp.mp4\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"abcdef");
}

#[tokio::test]
async fn test_download_passes_quality_through() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().returning(|_| Ok(sample_video()));
    extractor
        .expect_open_stream()
        .withf(|_, selector| *selector == MediaSelector::Video { format: Some("137".to_string()) })
        .times(1)
        .returning(|_, _| Ok(byte_stream(&["x"])));

    let response = create_test_router(extractor)
        .oneshot(get(&format!(
            "/api/youtube/download?url={}&quality=137",
            WATCH_URL_ENCODED
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_download_info_failure_never_opens_stream() {
    let mut extractor = MockExtractor::new();
    extractor
        .expect_video_info()
        .returning(|_| Err(MediaError::extraction_failed("ERROR: something broke", Some(1))));
    extractor.expect_open_stream().never();

    let response = create_test_router(extractor)
        .oneshot(get(&format!("/api/youtube/download?url={}", WATCH_URL_ENCODED)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to download video");
    assert_eq!(body["message"], "something broke");
}

#[tokio::test]
async fn test_download_audio_uses_audio_selector() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().returning(|_| {
        Ok(RawVideo {
            id: "dQw4w9WgXcQ".to_string(),
            title: Some("!!!".to_string()),
            ..Default::default()
        })
    });
    extractor
        .expect_open_stream()
        .withf(|_, selector| *selector == MediaSelector::Audio)
        .times(1)
        .returning(|_, _| Ok(byte_stream(&["audio"])));

    let response = create_test_router(extractor)
        .oneshot(get(&format!(
            "/api/youtube/download-audio?url={}&quality=137",
            WATCH_URL_ENCODED
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "audio/mpeg");
    // Title sanitizes to nothing, so the fallback token is used
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"audio.mp3\""
    );
}

#[tokio::test]
async fn test_download_stream_start_failure_is_json() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().returning(|_| Ok(sample_video()));
    extractor.expect_open_stream().returning(|_, _| {
        Err(MediaError::extraction_failed(
            "ERROR: [youtube] dQw4w9WgXcQ: Requested format is not available",
            Some(1),
        ))
    });

    let response = create_test_router(extractor)
        .oneshot(get("/api/youtube/download-audio?url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "Failed to download audio");
}

#[tokio::test]
async fn test_download_rejects_invalid_url() {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().never();
    extractor.expect_open_stream().never();

    let response = create_test_router(extractor)
        .oneshot(get("/api/youtube/download?url=https%3A%2F%2Fvimeo.com%2F1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid YouTube URL");
}

fn rate_limited_router(trust_proxy_headers: bool) -> Router {
    let mut extractor = MockExtractor::new();
    extractor.expect_video_info().never();
    let config = ApiConfig {
        rate_limit_rps: 2,
        trust_proxy_headers,
        ..ApiConfig::default()
    };
    create_router(AppState::new(config, Arc::new(extractor)), None)
}

fn info_request_from(peer: &str, forwarded_for: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/youtube/info")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Forwarded-For", forwarded_for)
        .body(Body::from(r#"{"url":"not a url"}"#))
        .unwrap();
    let peer: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

#[tokio::test]
async fn test_rate_limiting_keys_on_peer_address() {
    let app = rate_limited_router(false);

    // Rotating X-Forwarded-For from one peer does not earn new quota
    let mut statuses = Vec::new();
    for forwarded in ["203.0.113.1", "203.0.113.2", "203.0.113.3"] {
        let request = info_request_from("192.168.1.100:50000", forwarded);
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }
    assert_eq!(
        statuses,
        vec![StatusCode::BAD_REQUEST, StatusCode::BAD_REQUEST, StatusCode::TOO_MANY_REQUESTS]
    );

    let limited = app
        .clone()
        .oneshot(info_request_from("192.168.1.100:50001", "203.0.113.4"))
        .await
        .unwrap();
    assert_eq!(limited.headers().get(header::RETRY_AFTER).unwrap(), "1");

    // Another peer has its own quota
    let other = app
        .oneshot(info_request_from("192.168.1.101:50000", "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limiting_with_trusted_proxy_headers() {
    let app = rate_limited_router(true);

    // Behind a trusted proxy every forwarded client is limited separately
    for forwarded in ["203.0.113.1", "203.0.113.2", "203.0.113.3"] {
        let response = app
            .clone()
            .oneshot(info_request_from("10.0.0.1:50000", forwarded))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let mut statuses = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(info_request_from("10.0.0.1:50000", "203.0.113.1"))
            .await
            .unwrap();
        statuses.push(response.status());
    }
    assert_eq!(statuses, vec![StatusCode::BAD_REQUEST, StatusCode::TOO_MANY_REQUESTS]);
}
