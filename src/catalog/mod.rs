pub mod yandex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder title when the catalog does not supply one
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Placeholder artist when the catalog does not supply one
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Display metadata for a resolved track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    /// Duration in whole seconds, 0 when unknown
    pub duration_secs: u32,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            duration_secs: 0,
        }
    }
}

impl TrackMetadata {
    /// Replace empty fields with placeholders; metadata is cosmetic and its
    /// absence must never abort an acquisition.
    pub fn with_placeholders(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = UNKNOWN_TITLE.to_string();
        }
        if self.artist.trim().is_empty() {
            self.artist = UNKNOWN_ARTIST.to_string();
        }
        self
    }
}

/// One offered quality/link combination for a track
///
/// The materialized direct link is time-limited and must be fetched and used
/// within a single pipeline run.
#[derive(Debug, Clone)]
pub struct DownloadCandidate {
    pub codec: String,
    pub bitrate_kbps: u32,
    /// Intermediate URL from which the direct link is materialized
    pub download_info_url: String,
}

impl DownloadCandidate {
    /// File extension matching this candidate's container
    pub fn file_extension(&self) -> &str {
        if self.codec.is_empty() {
            "bin"
        } else {
            &self.codec
        }
    }
}

/// Track metadata plus the ordered set of download candidates
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub metadata: TrackMetadata,
    pub candidates: Vec<DownloadCandidate>,
}

/// Classified catalog failure
///
/// `IncompatibleResponse` is the typed condition that triggers fallback
/// resolution; every other kind is terminal for the run.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("track not found: {0}")]
    NotFound(String),

    #[error("incompatible catalog response: {0}")]
    IncompatibleResponse(String),

    #[error("unexpected catalog failure: {0}")]
    Unknown(String),
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// External catalog collaborator consumed by the pipeline
///
/// The pipeline is generic over this trait so tests can inject a substitute
/// client instead of the process-wide Yandex session.
#[allow(async_fn_in_trait)]
pub trait CatalogClient {
    /// Fetch metadata and download candidates for a track identifier
    async fn resolve_by_id(&self, track_id: &str) -> CatalogResult<ResolvedTrack>;

    /// Search the catalog by identifier and take the first result
    async fn search_by_id(&self, track_id: &str) -> CatalogResult<ResolvedTrack>;

    /// Materialize the time-limited direct link for a candidate
    async fn materialize_link(&self, candidate: &DownloadCandidate) -> CatalogResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metadata_fields_degrade_to_placeholders() {
        let metadata = TrackMetadata {
            title: "  ".to_string(),
            artist: String::new(),
            duration_secs: 10,
        }
        .with_placeholders();
        assert_eq!(metadata.title, UNKNOWN_TITLE);
        assert_eq!(metadata.artist, UNKNOWN_ARTIST);
        assert_eq!(metadata.duration_secs, 10);
    }

    #[test]
    fn populated_metadata_is_untouched() {
        let metadata = TrackMetadata {
            title: "X".to_string(),
            artist: "Y".to_string(),
            duration_secs: 245,
        };
        assert_eq!(metadata.clone().with_placeholders(), metadata);
    }

    #[test]
    fn candidate_extension_follows_codec() {
        let candidate = DownloadCandidate {
            codec: "aac".to_string(),
            bitrate_kbps: 128,
            download_info_url: String::new(),
        };
        assert_eq!(candidate.file_extension(), "aac");

        let unknown = DownloadCandidate {
            codec: String::new(),
            bitrate_kbps: 0,
            download_info_url: String::new(),
        };
        assert_eq!(unknown.file_extension(), "bin");
    }
}
