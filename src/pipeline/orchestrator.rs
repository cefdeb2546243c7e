use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::errors::{DownloaderError, Result};
use crate::pipeline::download::DownloadExecutor;
use crate::pipeline::resolver::CatalogResolver;
use crate::pipeline::transcode::FormatNormalizer;
use crate::pipeline::{select_best_candidate, url, DownloadedTrack, TemporaryArtifact, TrackRequest};
use tracing::{debug, info, warn};

/// Stages of one acquisition run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Normalized,
    Validated,
    Identified,
    Resolved,
    LinkSelected,
    Downloaded,
    FormatNormalized,
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Received => write!(f, "Received"),
            PipelineStage::Normalized => write!(f, "Normalized"),
            PipelineStage::Validated => write!(f, "Validated"),
            PipelineStage::Identified => write!(f, "Identified"),
            PipelineStage::Resolved => write!(f, "Resolved"),
            PipelineStage::LinkSelected => write!(f, "Link Selected"),
            PipelineStage::Downloaded => write!(f, "Downloaded"),
            PipelineStage::FormatNormalized => write!(f, "Format Normalized"),
            PipelineStage::Done => write!(f, "Done"),
        }
    }
}

/// Sequences one URL-to-artifact acquisition run
///
/// Linear stage machine; any stage can fail terminally with a classified
/// error. Temporary files live behind `TemporaryArtifact` guards, so every
/// exit path (including cancellation) deletes whatever intermediate exists,
/// and on success ownership of the final file passes to the caller.
pub struct Pipeline<'a, C: CatalogClient> {
    client: &'a C,
    config: &'a Config,
}

impl<'a, C: CatalogClient> Pipeline<'a, C> {
    pub fn new(client: &'a C, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Run the full pipeline for one raw URL
    pub async fn run(&self, raw_url: &str) -> Result<DownloadedTrack> {
        self.enter(PipelineStage::Received);

        let normalized = url::normalize_url(raw_url.trim());
        self.enter(PipelineStage::Normalized);

        if !url::validate_url(&normalized) {
            return Err(DownloaderError::InvalidUrl(normalized));
        }
        self.enter(PipelineStage::Validated);

        let track_id = url::extract_track_id(&normalized)
            .ok_or_else(|| DownloaderError::IdentifierNotFound(normalized.clone()))?;
        let request = TrackRequest {
            url: normalized,
            track_id,
        };
        self.enter(PipelineStage::Identified);
        debug!("Acquiring track {} from {}", request.track_id, request.url);

        let resolved = CatalogResolver::new(self.client)
            .resolve(&request.track_id)
            .await?;
        info!(
            "Resolved track {}: {} - {}",
            request.track_id, resolved.metadata.artist, resolved.metadata.title
        );
        self.enter(PipelineStage::Resolved);

        let candidate = select_best_candidate(&resolved.candidates).ok_or_else(|| {
            DownloaderError::Internal("candidate set was empty after resolution".to_string())
        })?;
        debug!(
            "Selected candidate: {} at {} kbps",
            candidate.codec, candidate.bitrate_kbps
        );
        let direct_link = match self.client.materialize_link(candidate).await {
            Ok(link) if !link.is_empty() => link,
            Ok(_) => return Err(DownloaderError::NoDirectLink),
            Err(e) => {
                warn!("Failed to materialize direct link: {}", e);
                return Err(DownloaderError::NoDirectLink);
            }
        };
        self.enter(PipelineStage::LinkSelected);

        let artifact = TemporaryArtifact::allocate(candidate.file_extension());
        let executor = DownloadExecutor::new(
            self.config.download_timeout(),
            self.config.min_download_size,
        );
        executor.fetch(&direct_link, artifact.path()).await?;
        debug!("Current artifact: {} bytes", artifact.size());
        self.enter(PipelineStage::Downloaded);

        let artifact = FormatNormalizer::new(self.config.target_bitrate_kbps)
            .normalize(artifact)
            .await?;
        self.enter(PipelineStage::FormatNormalized);

        self.enter(PipelineStage::Done);
        Ok(DownloadedTrack {
            file_path: artifact.into_path(),
            metadata: resolved.metadata,
        })
    }

    fn enter(&self, stage: PipelineStage) {
        debug!("Pipeline stage: {}", stage);
    }
}
