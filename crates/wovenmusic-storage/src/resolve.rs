//! Cover candidate extraction and URL resolution.
//!
//! A playlist row may carry its cover reference under any of a dozen legacy
//! column names, as a bare key, a relative path, or an absolute URL. This
//! module turns that mess into exactly one canonical URL: pick the first
//! non-empty candidate in priority order, then either re-root it under the
//! CDN base (own hosts) or pass it through verbatim (foreign hosts).

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use wovenmusic_core::constants::OWN_STORAGE_HOST_SUFFIXES;
use wovenmusic_core::models::Playlist;

use crate::keys::normalize_image_key;

/// Characters escaped inside a single path segment. Unreserved characters
/// (RFC 3986) stay literal; `/` is a separator and is never encoded here
/// because encoding runs per segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Return the first non-empty cover candidate from the row, trimmed.
///
/// Key-shaped columns are checked strictly before URL-shaped ones; a stored
/// key survives CDN base changes, a derived URL does not. Returns `None`
/// when the playlist has no cover at all (a 404 for callers, not an error).
pub fn extract_cover_candidate(playlist: &Playlist) -> Option<&str> {
    playlist
        .cover_candidates()
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Resolve a raw cover candidate to an absolute URL.
///
/// - absolute URL on our own CDN or object-storage host: keep the path,
///   renormalize it, recompose under `cdn_base`
/// - absolute URL on a foreign host: returned verbatim, never rewritten
/// - unparsable absolute URL: treated as a raw key
/// - anything else: normalized and composed as `{cdn_base}/{encoded key}`
pub fn resolve_cover_url(candidate: &str, cdn_base: &str) -> String {
    let candidate = candidate.trim();

    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        if let Ok(parsed) = Url::parse(candidate) {
            let host = parsed.host_str().unwrap_or_default();
            if is_own_host(host, cdn_base) {
                let key = normalize_image_key(&decoded_path(&parsed));
                return compose(cdn_base, &key);
            }
            return candidate.to_string();
        }
        // Malformed absolute URL, fall through to key handling.
    }

    let key = normalize_image_key(candidate);
    compose(cdn_base, &key)
}

/// Percent-encode a storage key for use as a URL path, segment by segment,
/// so literal `/` remain unescaped separators.
pub fn encode_key_path(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn compose(cdn_base: &str, key: &str) -> String {
    format!("{}/{}", cdn_base.trim_end_matches('/'), encode_key_path(key))
}

/// A host is ours if it matches the CDN host exactly or ends with one of the
/// known object-storage public-endpoint suffixes.
fn is_own_host(host: &str, cdn_base: &str) -> bool {
    if let Ok(base) = Url::parse(cdn_base) {
        if let Some(cdn_host) = base.host_str() {
            if host.eq_ignore_ascii_case(cdn_host) {
                return true;
            }
        }
    }
    let host = host.to_ascii_lowercase();
    OWN_STORAGE_HOST_SUFFIXES
        .iter()
        .any(|suffix| host.ends_with(suffix))
}

/// The URL path with percent-escapes undone, ready for renormalization and
/// exactly-once re-encoding.
fn decoded_path(url: &Url) -> String {
    url.path()
        .split('/')
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    const CDN: &str = "https://images.wovenmusic.app";

    fn playlist_with_no_cover() -> Playlist {
        Playlist {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            created_by: None,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            cover_storage_key: None,
            cover_key: None,
            image_key: None,
            artwork_key: None,
            cover_path: None,
            image_path: None,
            key: None,
            cover_image_url: None,
            image_url: None,
            cover_url: None,
            artwork_url: None,
            thumbnail_url: None,
            cover: None,
            image: None,
        }
    }

    #[test]
    fn test_extract_prefers_key_over_url() {
        let mut p = playlist_with_no_cover();
        p.cover_storage_key = Some("images/a.jpg".to_string());
        p.cover_url = Some("https://x/y.png".to_string());
        assert_eq!(extract_cover_candidate(&p), Some("images/a.jpg"));
    }

    #[test]
    fn test_extract_skips_empty_and_whitespace() {
        let mut p = playlist_with_no_cover();
        p.cover_storage_key = Some("   ".to_string());
        p.cover_key = Some("".to_string());
        p.image_url = Some(" https://cdn/pic.jpg ".to_string());
        assert_eq!(extract_cover_candidate(&p), Some("https://cdn/pic.jpg"));
    }

    #[test]
    fn test_extract_none_when_no_cover() {
        assert_eq!(extract_cover_candidate(&playlist_with_no_cover()), None);
    }

    #[test]
    fn test_resolve_foreign_url_passthrough() {
        let input = "https://othersite.example/pic.jpg";
        assert_eq!(resolve_cover_url(input, CDN), input);
    }

    #[test]
    fn test_resolve_own_cdn_url_rerooted() {
        assert_eq!(
            resolve_cover_url("https://images.wovenmusic.app/images/playlists/p1.jpg", CDN),
            "https://images.wovenmusic.app/images/playlists/p1.jpg"
        );
    }

    #[test]
    fn test_resolve_r2_url_rerooted_under_cdn() {
        assert_eq!(
            resolve_cover_url("https://pub-abc123.r2.dev/images/playlists/p1.jpg", CDN),
            "https://images.wovenmusic.app/images/playlists/p1.jpg"
        );
    }

    #[test]
    fn test_resolve_own_url_with_legacy_path_is_normalized() {
        assert_eq!(
            resolve_cover_url("https://pub-abc123.r2.dev/playlist-images/a.jpg", CDN),
            "https://images.wovenmusic.app/images/playlists/a.jpg"
        );
    }

    #[test]
    fn test_resolve_bare_key() {
        assert_eq!(
            resolve_cover_url("cover123.png", CDN),
            "https://images.wovenmusic.app/images/playlists/cover123.png"
        );
    }

    #[test]
    fn test_resolve_encodes_segments_but_not_separators() {
        assert_eq!(
            resolve_cover_url("images/playlists/my cover.png", CDN),
            "https://images.wovenmusic.app/images/playlists/my%20cover.png"
        );
    }

    #[test]
    fn test_resolve_own_url_does_not_double_encode() {
        assert_eq!(
            resolve_cover_url(
                "https://images.wovenmusic.app/images/playlists/my%20cover.png",
                CDN
            ),
            "https://images.wovenmusic.app/images/playlists/my%20cover.png"
        );
    }

    #[test]
    fn test_resolve_malformed_absolute_falls_back_to_key() {
        let resolved = resolve_cover_url("http://", CDN);
        assert!(resolved.starts_with(CDN), "resolved: {resolved}");
    }
}
