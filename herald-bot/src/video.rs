//! Social video download: resolve a post link to a direct video URL through the RapidAPI
//! "autolink" service, then fetch the file with a size cap.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("video link could not be resolved: {0}")]
    Resolve(String),

    #[error("no video found for the link")]
    NoVideo,

    #[error("video is {size_mb:.2} MB, over the limit")]
    TooLarge { size_mb: f64 },

    #[error("download failed: {0}")]
    Download(String),
}

fn megabytes(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Downloads the video behind a social post link.
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, VideoError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AutolinkResponse {
    #[serde(default)]
    medias: Vec<MediaItem>,
}

/// Picks the best video for the platform the link belongs to:
/// TikTok prefers `hd_no_watermark` then `no_watermark`; Instagram and Facebook prefer HD;
/// otherwise hd > sd > the first video.
pub fn preferred_video_url(link: &str, medias: &[MediaItem]) -> Option<String> {
    let link = link.to_lowercase();
    let videos: Vec<(&MediaItem, String)> = medias
        .iter()
        .filter(|m| m.kind == "video" && !m.url.is_empty())
        .map(|m| (m, m.quality.as_deref().unwrap_or("").to_lowercase()))
        .collect();

    let platform_pick = if link.contains("tiktok") {
        first_matching(&videos, &["hd_no_watermark"])
            .or_else(|| first_matching(&videos, &["no_watermark"]))
    } else if link.contains("instagram") {
        first_matching(&videos, &["p", "hd", "high"])
    } else if link.contains("facebook") {
        first_matching(&videos, &["hd"])
    } else {
        None
    };

    platform_pick
        .or_else(|| first_matching(&videos, &["hd", "high"]))
        .or_else(|| first_matching(&videos, &["sd", "medium"]))
        .or_else(|| videos.first().map(|(m, _)| m.url.clone()))
}

/// URL of the first video whose quality label contains any of `needles`.
fn first_matching(videos: &[(&MediaItem, String)], needles: &[&str]) -> Option<String> {
    videos
        .iter()
        .find(|(_, quality)| needles.iter().any(|n| quality.contains(n)))
        .map(|(m, _)| m.url.clone())
}

pub struct RapidApiDownloader {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    host: String,
    resolve_timeout: Duration,
    download_timeout: Duration,
    max_bytes: usize,
}

impl RapidApiDownloader {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        host: impl Into<String>,
        resolve_timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            host: host.into(),
            resolve_timeout,
            download_timeout: DOWNLOAD_TIMEOUT,
            max_bytes: MAX_VIDEO_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[instrument(skip(self))]
    async fn resolve(&self, link: &str) -> Result<String, VideoError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .json(&serde_json::json!({ "url": link }))
            .timeout(self.resolve_timeout)
            .send()
            .await
            .map_err(|e| VideoError::Resolve(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                404 => "video not found or private".to_string(),
                400 => "invalid link".to_string(),
                _ => format!("resolver returned {}", status),
            };
            warn!(status = %status, "Video resolver rejected the link");
            return Err(VideoError::Resolve(message));
        }

        let body: AutolinkResponse = response
            .json()
            .await
            .map_err(|e| VideoError::Resolve(e.to_string()))?;
        let url = preferred_video_url(link, &body.medias).ok_or(VideoError::NoVideo)?;
        info!(candidates = body.medias.len(), "Video link resolved");
        Ok(url)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, VideoError> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VideoError::Download(e.to_string()))?;

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(VideoError::TooLarge {
                    size_mb: megabytes(length as usize),
                });
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| VideoError::Download(e.to_string()))?
        {
            data.extend_from_slice(&chunk);
            if data.len() > self.max_bytes {
                return Err(VideoError::TooLarge {
                    size_mb: megabytes(data.len()),
                });
            }
        }
        Ok(data)
    }
}

#[async_trait]
impl VideoFetcher for RapidApiDownloader {
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, VideoError> {
        let url = self.resolve(link).await?;
        let data = self.download(&url).await?;
        info!(bytes = data.len(), "Video downloaded");
        Ok(data)
    }
}
