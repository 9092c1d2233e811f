use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::downloader::{DownloaderConfig, Downloader, MediaStream, StreamRequest};

/// Resolves streams by running the `yt-dlp` executable.
pub struct YtDlp {
    config: DownloaderConfig,
}

impl YtDlp {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    fn command(&self, video_url: &str, request: &StreamRequest) -> Command {
        let mut command = Command::new(&self.config.path);
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("-f")
            .arg(request.selector())
            .args(&self.config.extra_args)
            .arg(video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn resolve(
        &self,
        cancel: &CancellationToken,
        video_url: &str,
        request: &StreamRequest,
    ) -> Result<MediaStream> {
        let child = self.command(video_url, request).spawn().map_err(|e| {
            VidcastError::Downloader(format!(
                "failed to start {}: {}",
                self.config.path.display(),
                e
            ))
        })?;

        // Dropping the output future kills the child.
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(VidcastError::Cancelled),
            result = tokio::time::timeout(self.config.timeout(), child.wait_with_output()) => {
                result.map_err(|_| {
                    VidcastError::Downloader(format!("timed out resolving {}", video_url))
                })??
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidcastError::Downloader(format!(
                "yt-dlp exited with {} for {}: {}",
                output.status,
                video_url,
                stderr.trim()
            )));
        }

        parse_metadata(&output.stdout)
    }

    fn max_concurrency(&self) -> usize {
        self.config.max_concurrency
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    url: Option<String>,
    ext: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<f64>,
    duration: Option<f64>,
    #[serde(default)]
    requested_formats: Vec<FormatMetadata>,
}

#[derive(Debug, Deserialize)]
struct FormatMetadata {
    url: String,
    ext: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<f64>,
}

fn parse_metadata(stdout: &[u8]) -> Result<MediaStream> {
    let metadata: Metadata = serde_json::from_slice(stdout)?;

    // Merged formats have no top-level url, take the first requested stream
    let (url, format_ext, format_size) = match (&metadata.url, metadata.requested_formats.first()) {
        (Some(url), _) => (url.clone(), None, None),
        (None, Some(format)) => (
            format.url.clone(),
            format.ext.clone(),
            format
                .filesize
                .or(format.filesize_approx.map(|s| s as u64)),
        ),
        (None, None) => {
            return Err(VidcastError::Downloader(
                "yt-dlp returned no stream url".to_string(),
            ))
        }
    };

    let size = metadata
        .filesize
        .or(metadata.filesize_approx.map(|s| s as u64))
        .or(format_size);

    Ok(MediaStream {
        url,
        ext: metadata.ext.or(format_ext).unwrap_or_else(|| "mp4".to_string()),
        size,
        duration: metadata.duration.map(|d| d.round() as u64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Format, Quality};

    #[test]
    fn test_parse_single_stream() {
        let json = br#"{
            "id": "abc123",
            "url": "https://rr1.googlevideo.com/videoplayback?id=1",
            "ext": "m4a",
            "filesize": 4096,
            "duration": 61.6
        }"#;
        let stream = parse_metadata(json).unwrap();
        assert_eq!(stream.url, "https://rr1.googlevideo.com/videoplayback?id=1");
        assert_eq!(stream.ext, "m4a");
        assert_eq!(stream.size, Some(4096));
        assert_eq!(stream.duration, Some(62));
    }

    #[test]
    fn test_parse_merged_formats() {
        let json = br#"{
            "id": "abc123",
            "ext": "mp4",
            "duration": 10,
            "requested_formats": [
                {"url": "https://video.example/1", "ext": "mp4", "filesize_approx": 1000.4},
                {"url": "https://audio.example/2", "ext": "m4a"}
            ]
        }"#;
        let stream = parse_metadata(json).unwrap();
        assert_eq!(stream.url, "https://video.example/1");
        assert_eq!(stream.size, Some(1000));
        assert_eq!(stream.duration, Some(10));
    }

    #[test]
    fn test_parse_without_stream() {
        let err = parse_metadata(br#"{"id": "abc123"}"#).unwrap_err();
        assert!(matches!(err, VidcastError::Downloader(_)));
    }

    #[test]
    fn test_command_arguments() {
        let ytdlp = YtDlp::new(DownloaderConfig {
            extra_args: vec!["--cookies".into(), "c.txt".into()],
            ..Default::default()
        });
        let request = StreamRequest {
            format: Format::Audio,
            quality: Quality::High,
            max_height: None,
        };
        let command = ytdlp.command("https://www.youtube.com/watch?v=abc123", &request);
        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc123");
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "bestaudio"));
        assert!(args.windows(2).any(|w| w[0] == "--cookies" && w[1] == "c.txt"));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let ytdlp = YtDlp::new(DownloaderConfig {
            path: "/nonexistent/yt-dlp".into(),
            ..Default::default()
        });
        let request = StreamRequest {
            format: Format::Video,
            quality: Quality::High,
            max_height: None,
        };
        let err = ytdlp
            .resolve(&CancellationToken::new(), "https://www.youtube.com/watch?v=x", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, VidcastError::Downloader(_)));
    }
}
