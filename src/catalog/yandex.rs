use crate::catalog::{
    CatalogClient, CatalogError, CatalogResult, DownloadCandidate, ResolvedTrack, TrackMetadata,
};
use crate::config::Config;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const API_BASE: &str = "https://api.music.yandex.net";

/// Salt used by the Yandex CDN to sign direct download paths
const LINK_SIGNING_SALT: &str = "XGRlBW9FXlekgbPrRHuSiA";

static SESSION: OnceCell<YandexClient> = OnceCell::const_new();

/// Process-wide catalog session, created once on first use
///
/// Session creation is idempotent; the once-barrier keeps concurrent first
/// callers from racing redundant initializations.
pub async fn session(config: &Config) -> &'static YandexClient {
    SESSION
        .get_or_init(|| async {
            let client = YandexClient::new(config.token.clone(), config.request_timeout());
            if client.is_authenticated() {
                info!("Yandex Music session initialized with token");
            } else {
                info!("Yandex Music session initialized anonymously (limited access)");
            }
            client
        })
        .await
}

/// Yandex Music catalog API client
pub struct YandexClient {
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    result: Vec<TrackNode>,
}

#[derive(Debug, Deserialize)]
struct TrackNode {
    title: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistNode>,
    #[serde(rename = "durationMs")]
    duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ArtistNode {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    tracks: Option<SearchTracks>,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    results: Vec<SearchTrackNode>,
}

#[derive(Debug, Deserialize)]
struct SearchTrackNode {
    // Yandex returns numeric ids for tracks and string ids for some
    // user-generated entries
    id: serde_json::Value,
    #[serde(flatten)]
    track: TrackNode,
}

#[derive(Debug, Deserialize)]
struct DownloadInfoResponse {
    result: Vec<DownloadInfoNode>,
}

#[derive(Debug, Deserialize)]
struct DownloadInfoNode {
    codec: Option<String>,
    #[serde(rename = "bitrateInKbps")]
    bitrate_in_kbps: Option<u32>,
    #[serde(rename = "downloadInfoUrl")]
    download_info_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectLinkNode {
    s: String,
    ts: String,
    path: String,
    host: String,
}

impl YandexClient {
    /// Create a new client; absent token degrades to anonymous access
    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("YandexMusicDownloader/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, token }
    }

    /// Whether this session carries an OAuth token
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CatalogResult<T> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("OAuth {}", token));
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::Auth(format!("server returned {}", status)));
        } else if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(format!("server returned {}", status)));
        } else if !status.is_success() {
            return Err(CatalogError::Unknown(format!("server returned {}", status)));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                CatalogError::IncompatibleResponse(e.to_string())
            } else {
                classify_transport(e)
            }
        })
    }

    async fn fetch_candidates(&self, track_id: &str) -> CatalogResult<Vec<DownloadCandidate>> {
        let url = format!("{}/tracks/{}/download-info", API_BASE, track_id);
        let response: DownloadInfoResponse = self.get_json(&url).await?;

        let candidates = response
            .result
            .into_iter()
            .filter_map(|node| {
                let download_info_url = node.download_info_url?;
                Some(DownloadCandidate {
                    codec: node.codec.unwrap_or_default().to_lowercase(),
                    bitrate_kbps: node.bitrate_in_kbps.unwrap_or(0),
                    download_info_url,
                })
            })
            .collect();

        Ok(candidates)
    }
}

impl CatalogClient for YandexClient {
    async fn resolve_by_id(&self, track_id: &str) -> CatalogResult<ResolvedTrack> {
        debug!("Resolving track {} from catalog", track_id);
        let url = format!("{}/tracks/{}", API_BASE, track_id);
        let response: TracksResponse = self.get_json(&url).await?;

        let node = response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(format!("track {}", track_id)))?;

        Ok(ResolvedTrack {
            metadata: metadata_from_node(&node),
            candidates: self.fetch_candidates(track_id).await?,
        })
    }

    async fn search_by_id(&self, track_id: &str) -> CatalogResult<ResolvedTrack> {
        debug!("Searching catalog for track {}", track_id);
        let url = format!(
            "{}/search?text={}&type=track&page=0",
            API_BASE,
            urlencoding::encode(track_id)
        );
        let response: SearchResponse = self.get_json(&url).await?;

        let node = response
            .result
            .and_then(|r| r.tracks)
            .map(|t| t.results)
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(format!("no search results for {}", track_id)))?;

        let found_id = id_to_string(&node.id)
            .ok_or_else(|| CatalogError::IncompatibleResponse("search result without id".into()))?;

        Ok(ResolvedTrack {
            metadata: metadata_from_node(&node.track),
            candidates: self.fetch_candidates(&found_id).await?,
        })
    }

    async fn materialize_link(&self, candidate: &DownloadCandidate) -> CatalogResult<String> {
        let separator = if candidate.download_info_url.contains('?') {
            '&'
        } else {
            '?'
        };
        let url = format!("{}{}format=json", candidate.download_info_url, separator);
        let node: DirectLinkNode = self.get_json(&url).await?;
        Ok(build_direct_link(&node))
    }
}

/// Assemble and sign the CDN direct link from its parts
fn build_direct_link(node: &DirectLinkNode) -> String {
    let trimmed_path = node.path.strip_prefix('/').unwrap_or(&node.path);
    let sign = md5::compute(format!("{}{}{}", LINK_SIGNING_SALT, trimmed_path, node.s));
    format!(
        "https://{}/get-mp3/{:x}/{}{}",
        node.host, sign, node.ts, node.path
    )
}

fn metadata_from_node(node: &TrackNode) -> TrackMetadata {
    TrackMetadata {
        title: node.title.clone().unwrap_or_default(),
        artist: node
            .artists
            .first()
            .and_then(|a| a.name.clone())
            .unwrap_or_default(),
        duration_secs: (node.duration_ms.unwrap_or(0) / 1000) as u32,
    }
    .with_placeholders()
}

fn id_to_string(id: &serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn classify_transport(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        CatalogError::Network(e.to_string())
    } else {
        CatalogError::Unknown(e.to_string())
    }
}
