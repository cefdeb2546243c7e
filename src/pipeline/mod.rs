pub mod download;
pub mod orchestrator;
pub mod resolver;
pub mod transcode;
pub mod url;

pub use orchestrator::Pipeline;

use crate::catalog::{DownloadCandidate, TrackMetadata};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One normalized and validated incoming request
///
/// Only constructed after validation and identifier extraction succeed, so a
/// value of this type is always usable by the resolver.
#[derive(Debug, Clone)]
pub struct TrackRequest {
    pub url: String,
    pub track_id: String,
}

/// Successful pipeline outcome
///
/// The file at `file_path` is owned by the receiver, who is responsible for
/// its eventual deletion.
#[derive(Debug)]
pub struct DownloadedTrack {
    pub file_path: PathBuf,
    pub metadata: TrackMetadata,
}

/// RAII guard for a temporary audio file
///
/// Exactly one artifact is "current" at any point in a run. Dropping an
/// unreleased guard removes the file, so cleanup holds on early return, on
/// error, and when the run's task is cancelled. Removal failures are logged
/// and never mask the primary result.
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    released: bool,
}

impl TemporaryArtifact {
    /// Reserve a fresh unique path in the temp directory; nothing is created
    /// on disk yet
    pub fn allocate(extension: &str) -> Self {
        Self {
            path: crate::utils::temp_file_path(extension),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file on disk, 0 if it does not exist yet
    pub fn size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Release ownership of the file to the caller; the guard no longer
    /// deletes it
    pub fn into_path(mut self) -> PathBuf {
        self.released = true;
        self.path.clone()
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        if self.released || !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(
                "Failed to remove temporary file {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Pick the best-quality candidate: maximum bitrate, first-seen wins ties
///
/// `None` only on an empty set; resolution fails before selection when no
/// candidates exist, so the orchestrator treats that as an internal error.
pub fn select_best_candidate(candidates: &[DownloadCandidate]) -> Option<&DownloadCandidate> {
    let mut iter = candidates.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if candidate.bitrate_kbps > best.bitrate_kbps {
            best = candidate;
        }
    }
    Some(best)
}
