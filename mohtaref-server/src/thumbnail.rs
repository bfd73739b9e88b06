//! Still-frame extraction for video thumbnails.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use mohtaref_core::errors::SiteError;
use serde_json::json;
use tokio::process::Command;

const FFMPEG_MISSING: &str = "FFmpeg is not installed. Please install FFmpeg to generate \
                              thumbnails automatically, or upload a thumbnail manually.";
const EXTRACTION_FAILED: &str = "Failed to generate thumbnail. Please upload a thumbnail manually.";

/// Position of the extracted frame.
const FRAME_AT: &str = "00:00:01";

/// Turns a video payload into a JPEG still.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(&self, video: &[u8]) -> Result<Vec<u8>>;
}

/// Runs the `ffmpeg` binary inside a temporary directory that is removed
/// when extraction returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    bin: String,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegExtractor {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// `ffmpeg -version` runs and exits cleanly.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.bin)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn run(&self, input: &Path, output: &Path) -> Result<()> {
        let out = Command::new(&self.bin)
            .arg("-i")
            .arg(input)
            .args(["-ss", FRAME_AT, "-vframes", "1", "-q:v", "2"])
            .arg(output)
            .arg("-y")
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("spawning {}", self.bin))?;

        if !out.status.success() || !output.exists() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let details = stderr.lines().last().unwrap_or_default().to_string();
            tracing::warn!(status = ?out.status.code(), details = %details, "ffmpeg failed");
            return Err(SiteError::general_error(EXTRACTION_FAILED)
                .with_data(json!({ "details": details }))
                .into_anyhow());
        }
        Ok(())
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract_frame(&self, video: &[u8]) -> Result<Vec<u8>> {
        let dir = tempfile::Builder::new()
            .prefix("mohtaref-thumb-")
            .tempdir()
            .context("creating thumbnail workspace")?;
        let input = dir.path().join("video.mp4");
        let output = dir.path().join("thumbnail.jpg");

        tokio::fs::write(&input, video)
            .await
            .context("writing video to thumbnail workspace")?;

        if !self.is_available().await {
            return Err(SiteError::unavailable(FFMPEG_MISSING)
                .with_data(json!({ "requiresFFmpeg": true }))
                .into_anyhow());
        }

        self.run(&input, &output).await?;

        let jpeg = tokio::fs::read(&output)
            .await
            .context("reading extracted thumbnail")?;
        tracing::debug!(size = jpeg.len(), "extracted thumbnail frame");
        Ok(jpeg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mohtaref_core::ErrorKind;

    #[tokio::test]
    async fn missing_binary_asks_for_a_manual_upload() {
        let ffmpeg = FfmpegExtractor::new("mohtaref-no-such-ffmpeg");
        assert!(!ffmpeg.is_available().await);

        let err = ffmpeg.extract_frame(b"not a video").await.unwrap_err();
        let site = SiteError::from_anyhow(&err).unwrap();
        assert_eq!(site.kind, ErrorKind::Unavailable);
        assert_eq!(site.data.as_ref().unwrap()["requiresFFmpeg"], true);
    }
}
