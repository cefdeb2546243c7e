use crate::catalog::{CatalogClient, CatalogError, ResolvedTrack};
use crate::errors::{DownloaderError, Result};
use tracing::warn;

/// Resolves a track identifier against the catalog client
///
/// Fallback search is the only automatic recovery in the pipeline, and it
/// triggers solely on the typed `IncompatibleResponse` classification; every
/// other catalog failure is terminal for the run.
pub struct CatalogResolver<'a, C: CatalogClient> {
    client: &'a C,
}

impl<'a, C: CatalogClient> CatalogResolver<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Resolve metadata and a non-empty candidate set for a track identifier
    pub async fn resolve(&self, track_id: &str) -> Result<ResolvedTrack> {
        let mut resolved = match self.client.resolve_by_id(track_id).await {
            Ok(resolved) => resolved,
            Err(CatalogError::IncompatibleResponse(reason)) => {
                warn!(
                    "Primary resolution of track {} returned an incompatible response ({}), \
                     falling back to catalog search",
                    track_id, reason
                );
                self.client.search_by_id(track_id).await?
            }
            Err(e) => return Err(e.into()),
        };

        resolved.metadata = resolved.metadata.with_placeholders();

        if resolved.candidates.is_empty() {
            return Err(DownloaderError::NoDownloadCandidates);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogResult, DownloadCandidate, TrackMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Primary {
        Found,
        Incompatible,
        AuthRejected,
        FoundWithoutCandidates,
    }

    struct StubCatalog {
        primary: Primary,
        search_calls: AtomicUsize,
    }

    impl StubCatalog {
        fn new(primary: Primary) -> Self {
            Self {
                primary,
                search_calls: AtomicUsize::new(0),
            }
        }

        fn resolved(title: &str) -> ResolvedTrack {
            ResolvedTrack {
                metadata: TrackMetadata {
                    title: title.to_string(),
                    artist: "Y".to_string(),
                    duration_secs: 245,
                },
                candidates: vec![DownloadCandidate {
                    codec: "mp3".to_string(),
                    bitrate_kbps: 192,
                    download_info_url: "stub".to_string(),
                }],
            }
        }
    }

    impl CatalogClient for StubCatalog {
        async fn resolve_by_id(&self, _track_id: &str) -> CatalogResult<ResolvedTrack> {
            match self.primary {
                Primary::Found => Ok(Self::resolved("primary")),
                Primary::Incompatible => Err(CatalogError::IncompatibleResponse(
                    "unexpected schema".to_string(),
                )),
                Primary::AuthRejected => Err(CatalogError::Auth("401".to_string())),
                Primary::FoundWithoutCandidates => Ok(ResolvedTrack {
                    candidates: Vec::new(),
                    ..Self::resolved("primary")
                }),
            }
        }

        async fn search_by_id(&self, _track_id: &str) -> CatalogResult<ResolvedTrack> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::resolved("fallback"))
        }

        async fn materialize_link(&self, _candidate: &DownloadCandidate) -> CatalogResult<String> {
            unreachable!("resolver never materializes links")
        }
    }

    #[tokio::test]
    async fn primary_resolution_skips_fallback() {
        let catalog = StubCatalog::new(Primary::Found);
        let resolved = CatalogResolver::new(&catalog).resolve("1").await.unwrap();
        assert_eq!(resolved.metadata.title, "primary");
        assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incompatible_response_triggers_search_fallback() {
        let catalog = StubCatalog::new(Primary::Incompatible);
        let resolved = CatalogResolver::new(&catalog).resolve("1").await.unwrap();
        assert_eq!(resolved.metadata.title, "fallback");
        assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auth_failure_propagates_without_fallback() {
        let catalog = StubCatalog::new(Primary::AuthRejected);
        let err = CatalogResolver::new(&catalog)
            .resolve("1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownloaderError::Resolution(CatalogError::Auth(_))
        ));
        assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_candidate_set_fails_resolution() {
        let catalog = StubCatalog::new(Primary::FoundWithoutCandidates);
        let err = CatalogResolver::new(&catalog)
            .resolve("1")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloaderError::NoDownloadCandidates));
    }
}
