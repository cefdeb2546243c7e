use crate::catalog::CatalogError;
use thiserror::Error;

/// Main error type for the Yandex Music downloader application
///
/// Every pipeline component converts its raw failures into one of these
/// classifications at its own boundary; the orchestrator only forwards them.
#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("Invalid Yandex Music link: {0}")]
    InvalidUrl(String),

    #[error("Could not find a track identifier in link: {0}")]
    IdentifierNotFound(String),

    #[error("Failed to resolve track: {0}")]
    Resolution(#[from] CatalogError),

    #[error("No download candidates available for this track")]
    NoDownloadCandidates,

    #[error("Could not obtain a direct download link")]
    NoDirectLink,

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Downloaded file is too small ({0} bytes), the track is likely unavailable")]
    DownloadTooSmall(u64),

    #[error("Audio conversion failed: {0}")]
    TranscodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DownloaderError {
    /// Advisory hint for the presentation layer, chosen by error classification.
    ///
    /// The hint supplements the short message; callers may render it or not.
    pub fn advisory_hint(&self) -> Option<&'static str> {
        match self {
            DownloaderError::InvalidUrl(_) => Some(
                "Send a link like https://music.yandex.ru/track/1234567 or \
                 https://music.yandex.ru/album/1234567/track/7654321",
            ),
            DownloaderError::IdentifierNotFound(_) => Some(
                "Only single-track links are supported; album and playlist pages \
                 cannot be downloaded directly",
            ),
            DownloaderError::Resolution(CatalogError::NotFound(_)) => Some(
                "The track may be unavailable in your region or removed from the catalog",
            ),
            DownloaderError::Resolution(CatalogError::Auth(_)) => Some(
                "Your Yandex Music token may be missing or expired; refresh it and try again",
            ),
            DownloaderError::NoDownloadCandidates | DownloaderError::NoDirectLink => Some(
                "Downloading this track may require an authenticated Yandex Music session",
            ),
            DownloaderError::TranscodeFailed(_) => Some(
                "Check that ffmpeg is installed and available in PATH",
            ),
            _ => None,
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, DownloaderError>;
