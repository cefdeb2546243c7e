use crate::errors::{DownloaderError, Result};
use crate::pipeline::TemporaryArtifact;
use std::path::Path;
use tracing::info;

/// Canonical output container for every finished track
pub const TARGET_EXTENSION: &str = "mp3";

const TARGET_CODEC: &str = "libmp3lame";

/// Coerces a downloaded artifact into the target container
///
/// Artifacts already in the target container pass through untouched; anything
/// else is re-encoded with ffmpeg at the configured bitrate and the
/// pre-transcode intermediate is deleted.
pub struct FormatNormalizer {
    bitrate_kbps: u32,
}

impl FormatNormalizer {
    pub fn new(bitrate_kbps: u32) -> Self {
        Self { bitrate_kbps }
    }

    /// Whether a path already carries the target container extension
    pub fn is_target_format(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(TARGET_EXTENSION))
            .unwrap_or(false)
    }

    /// Hand back the current artifact in the target container
    ///
    /// On transcode failure both the original and any partial output are
    /// removed by their guards before the error propagates.
    pub async fn normalize(&self, artifact: TemporaryArtifact) -> Result<TemporaryArtifact> {
        if Self::is_target_format(artifact.path()) {
            return Ok(artifact);
        }

        info!(
            "Transcoding {} to {} at {} kbps",
            artifact.path().display(),
            TARGET_EXTENSION,
            self.bitrate_kbps
        );

        let output = TemporaryArtifact::allocate(TARGET_EXTENSION);
        self.transcode(artifact.path(), output.path()).await?;
        // The original intermediate is deleted here when `artifact` drops
        Ok(output)
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = tokio::process::Command::new("ffmpeg");
        cmd.arg("-i").arg(input);
        cmd.arg("-acodec").arg(TARGET_CODEC);
        cmd.arg("-b:a").arg(format!("{}k", self.bitrate_kbps));
        cmd.arg("-loglevel").arg("error");
        cmd.arg("-y");
        cmd.arg(output);

        let result = cmd.output().await.map_err(|e| {
            DownloaderError::TranscodeFailed(format!("failed to execute ffmpeg: {}", e))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DownloaderError::TranscodeFailed(
                stderr.trim().to_string(),
            ));
        }

        Ok(())
    }
}
