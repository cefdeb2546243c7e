use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Kind of Yandex Music URL a pattern recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Track,
    AlbumTrack,
    Playlist,
}

impl UrlKind {
    /// Whether URLs of this kind carry a single track identifier
    ///
    /// Playlist pages validate as Yandex Music links but address a collection,
    /// not one track, so extraction intentionally yields nothing for them.
    fn has_track_id(self) -> bool {
        !matches!(self, UrlKind::Playlist)
    }
}

struct UrlPattern {
    kind: UrlKind,
    pattern: Regex,
}

/// Single pattern table consumed by both validation and extraction
static URL_PATTERNS: LazyLock<Vec<UrlPattern>> = LazyLock::new(|| {
    vec![
        UrlPattern {
            kind: UrlKind::Track,
            pattern: Regex::new(r"^https?://music\.yandex\.(?:ru|com)/track/(\d+)").unwrap(),
        },
        UrlPattern {
            kind: UrlKind::AlbumTrack,
            pattern: Regex::new(r"^https?://music\.yandex\.(?:ru|com)/album/\d+/track/(\d+)")
                .unwrap(),
        },
        UrlPattern {
            kind: UrlKind::Playlist,
            pattern: Regex::new(r"^https?://music\.yandex\.(?:ru|com)/users/[\w-]+/playlists/\d+")
                .unwrap(),
        },
    ]
});

/// Strip tracking query parameters from a URL
///
/// Total and idempotent; anything that does not parse as an absolute URL
/// (including a string that is nothing but query parameters) is returned
/// unchanged.
pub fn normalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return url.to_string();
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_key(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.to_string()
}

fn is_tracking_key(key: &str) -> bool {
    key.starts_with("utm_") || key == "ref" || key == "from"
}

/// Check whether a normalized URL is an accepted Yandex Music link
///
/// Deliberately returns only a boolean; callers present one generic
/// "invalid link" message regardless of which shape failed.
pub fn validate_url(url: &str) -> bool {
    let without_query = url.split('?').next().unwrap_or(url);
    URL_PATTERNS
        .iter()
        .any(|p| p.pattern.is_match(without_query))
}

/// Extract the numeric track identifier from a normalized URL
///
/// Returns `None` for URLs without a single-track identifier (absence, not an
/// error); the orchestrator classifies that distinctly from validation
/// rejection.
pub fn extract_track_id(url: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or(url);
    URL_PATTERNS
        .iter()
        .filter(|p| p.kind.has_track_id())
        .find_map(|p| {
            p.pattern
                .captures(without_query)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
}
