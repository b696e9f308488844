//! yt-dlp backed extractor.
//!
//! Metadata calls run yt-dlp to completion and parse its JSON output.
//! Media streams run yt-dlp with `-o -` and expose its stdout as a byte
//! stream. The child process is owned by the stream and spawned with
//! `kill_on_drop`, so a client disconnect tears down the upstream download.
//! A stream only ends cleanly once the process has exited successfully.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, Stream, StreamExt};
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use ytp_models::MAX_PLAYLIST_VIDEOS;

use crate::error::{error_line, MediaError, MediaResult};
use crate::extractor::{Extractor, MediaSelector, MediaStream};
use crate::models::{RawPlaylist, RawVideo};

/// Browser-like User-Agent sent upstream to reduce blocking.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Read buffer size for media streams.
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// stderr lines retained for error reporting.
const MAX_STDERR_LINES: usize = 50;

/// Playlist entries requested upstream: one past the response cap so
/// truncation stays detectable.
const PLAYLIST_FETCH_LIMIT: usize = MAX_PLAYLIST_VIDEOS + 1;

/// Extractor configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary
    pub binary: PathBuf,
    /// User-Agent header sent upstream
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let binary = std::env::var("YTDLP_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| which::which("yt-dlp").ok())
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));

        Self {
            binary,
            user_agent: std::env::var("YTDLP_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

/// Extractor that shells out to yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "--no-warnings".to_string(),
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
        ]
    }

    /// Arguments for a single-video metadata dump.
    pub fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(
            ["--dump-single-json", "--skip-download", "--no-playlist", "--", url]
                .map(String::from),
        );
        args
    }

    /// Arguments for a flat playlist dump.
    pub fn playlist_args(&self, url: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(
            ["--dump-single-json", "--flat-playlist", "--yes-playlist", "--playlist-end"]
                .map(String::from),
        );
        args.push(PLAYLIST_FETCH_LIMIT.to_string());
        args.extend(["--", url].map(String::from));
        args
    }

    /// Arguments for streaming a rendition to stdout.
    pub fn stream_args(&self, url: &str, selector: &MediaSelector) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(
            [
                "--quiet",
                "--no-playlist",
                "--no-part",
                "-f",
                selector.format_expr(),
                "-o",
                "-",
                "--",
                url,
            ]
            .map(String::from),
        );
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[String]) -> MediaResult<T> {
        let output = self
            .command(args)
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(MediaError::extraction_failed(&stderr, output.status.code()));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn video_info(&self, url: &str) -> MediaResult<RawVideo> {
        debug!(url = %url, "Extracting video info");
        let mut video: RawVideo = self.run_json(&self.info_args(url)).await?;
        // yt-dlp lists formats worst first
        video.formats.reverse();
        debug!(video_id = %video.id, formats = video.formats.len(), "Extracted video info");
        Ok(video)
    }

    async fn playlist_info(&self, url: &str) -> MediaResult<RawPlaylist> {
        debug!(url = %url, "Extracting playlist info");
        let playlist: RawPlaylist = self.run_json(&self.playlist_args(url)).await?;
        debug!(playlist_id = %playlist.id, entries = playlist.entries.len(), "Extracted playlist info");
        Ok(playlist)
    }

    async fn open_stream(&self, url: &str, selector: MediaSelector) -> MediaResult<MediaStream> {
        let args = self.stream_args(url, &selector);
        let mut child = self.command(&args).spawn().map_err(map_spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("yt-dlp stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("yt-dlp stderr was not captured"))?;

        let stderr_task = tokio::spawn(drain_stderr(stderr, url.to_string()));
        let mut reader = ReaderStream::with_capacity(stdout, STREAM_CHUNK_SIZE);

        match reader.next().await {
            Some(Ok(first)) => {
                info!(url = %url, format = %selector.format_expr(), "Started media stream");
                let rest = ChildStream::new(child, reader);
                Ok(Box::pin(stream::iter(std::iter::once(Ok(first))).chain(rest)))
            }
            Some(Err(e)) => Err(MediaError::Io(e)),
            None => {
                let status = child.wait().await?;
                let stderr = stderr_task.await.unwrap_or_default().join("\n");
                if status.success() {
                    Err(MediaError::EmptyStream {
                        message: error_line(&stderr),
                    })
                } else {
                    Err(MediaError::extraction_failed(&stderr, status.code()))
                }
            }
        }
    }

    async fn check_available(&self) -> MediaResult<String> {
        let output = self
            .command(&["--version".to_string()])
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::extraction_failed(&stderr, output.status.code()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn map_spawn_error(e: io::Error) -> MediaError {
    if e.kind() == io::ErrorKind::NotFound {
        MediaError::YtDlpNotFound
    } else {
        MediaError::Io(e)
    }
}

/// Log yt-dlp stderr as it arrives and keep the tail for error reporting.
async fn drain_stderr(stderr: ChildStderr, url: String) -> Vec<String> {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(MAX_STDERR_LINES);

    while let Ok(Some(line)) = lines.next_line().await {
        if line.starts_with("ERROR") {
            warn!(url = %url, "yt-dlp: {}", line);
        } else {
            debug!(url = %url, "yt-dlp: {}", line);
        }
        if tail.len() == MAX_STDERR_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    tail.into()
}

/// yt-dlp stdout as a byte stream. The exit future owns the child, so
/// dropping the stream kills the process.
struct ChildStream {
    inner: ReaderStream<ChildStdout>,
    exit: BoxFuture<'static, io::Result<ExitStatus>>,
    eof: bool,
    finished: bool,
}

impl ChildStream {
    fn new(mut child: Child, inner: ReaderStream<ChildStdout>) -> Self {
        Self {
            inner,
            exit: async move { child.wait().await }.boxed(),
            eof: false,
            finished: false,
        }
    }
}

impl Stream for ChildStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        if !self.eof {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(None) => self.eof = true,
                other => return other,
            }
        }

        // stdout can close before the process exits; the exit status decides
        // whether the transfer completed
        let status = match self.exit.poll_unpin(cx) {
            Poll::Ready(status) => status,
            Poll::Pending => return Poll::Pending,
        };
        self.finished = true;

        match status {
            Ok(status) if status.success() => Poll::Ready(None),
            Ok(status) => Poll::Ready(Some(Err(io::Error::other(format!(
                "yt-dlp exited with {}",
                status
            ))))),
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }
}
