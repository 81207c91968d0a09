//! Canonical storage key handling.
//!
//! Several generations of upload code wrote cover references with different
//! prefixes (`playlist-images/`, `profile-images/`, bare filenames). Every
//! consumer must agree on one canonical shape or covers silently 404, so
//! normalization and key generation live here and nowhere else.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use wovenmusic_core::constants::THUMBNAIL_SUFFIX;

/// Image key category, the first path segment under `images/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    Playlists,
    Profiles,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Playlists => "playlists",
            ImageCategory::Profiles => "profiles",
        }
    }
}

/// Normalize an arbitrary legacy cover reference into a canonical image key.
///
/// Total and deterministic; does not validate extensions or existence.
/// Rules, in order:
/// 1. trim whitespace, strip leading slashes
/// 2. rewrite `playlist-images/` and `profile-images/` to `images/`; the
///    profile rewrite is terminal (profile covers sit directly under
///    `images/`, not under `images/playlists/`)
/// 3. a bare filename (no `/`) goes to `images/playlists/<filename>`
/// 4. `images/<filename>` with no further segment also goes to
///    `images/playlists/<filename>`
/// 5. anything else not under `images/` gets prefixed with `images/`
pub fn normalize_image_key(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');

    if let Some(rest) = trimmed.strip_prefix("profile-images/") {
        return format!("images/{}", rest);
    }

    let key = if let Some(rest) = trimmed.strip_prefix("playlist-images/") {
        format!("images/{}", rest)
    } else {
        trimmed.to_string()
    };

    if !key.contains('/') {
        return format!("images/playlists/{}", key);
    }

    if let Some(rest) = key.strip_prefix("images/") {
        if !rest.contains('/') {
            return format!("images/playlists/{}", rest);
        }
        return key;
    }

    format!("images/{}", key)
}

/// Generate a unique track key: `tracks/{yyyy}/{mm}/{dd}/{uuid}-{basename}.{ext}`.
///
/// The uuid component guarantees two uploads with identical filenames on the
/// same day never collide.
pub fn generate_track_key(now: DateTime<Utc>, filename_hint: &str, ext: &str) -> String {
    format!(
        "tracks/{:04}/{:02}/{:02}/{}-{}.{}",
        now.year(),
        now.month(),
        now.day(),
        Uuid::new_v4(),
        sanitize_basename(filename_hint),
        ext.to_lowercase()
    )
}

/// Generate a unique image key: `images/{category}/{entity_id}-{uuid}.{ext}`.
///
/// Keys are unique per upload so streamed image bytes can carry an immutable
/// cache policy; replacing a cover writes a new key rather than overwriting.
pub fn generate_image_key(category: ImageCategory, entity_id: &str, ext: &str) -> String {
    format!(
        "images/{}/{}-{}.{}",
        category.as_str(),
        sanitize_basename(entity_id),
        Uuid::new_v4(),
        ext.to_lowercase()
    )
}

/// Derive the 300x300 thumbnail key for an image key: the stem gains a
/// `_300x300` suffix and the extension becomes `jpg` (thumbnails are always
/// re-encoded as JPEG).
pub fn thumbnail_key(image_key: &str) -> String {
    let stem = match image_key.rfind('.') {
        // A dot inside the final path segment is an extension separator.
        Some(idx) if !image_key[idx..].contains('/') => &image_key[..idx],
        _ => image_key,
    };
    format!("{}{}.jpg", stem, THUMBNAIL_SUFFIX)
}

/// Strip a filename hint down to characters safe inside a storage key.
fn sanitize_basename(hint: &str) -> String {
    // Drop any path component and the extension from the hint.
    let name = hint.rsplit(['/', '\\']).next().unwrap_or(hint);
    let stem = match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    };

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_legacy_playlist_prefix() {
        assert_eq!(
            normalize_image_key("playlist-images/abc.jpg"),
            "images/playlists/abc.jpg"
        );
        assert_eq!(
            normalize_image_key("playlist-images/playlists/abc.jpg"),
            "images/playlists/abc.jpg"
        );
    }

    #[test]
    fn test_normalize_legacy_profile_prefix_is_terminal() {
        assert_eq!(
            normalize_image_key("profile-images/abc.jpg"),
            "images/abc.jpg"
        );
    }

    #[test]
    fn test_normalize_bare_filename() {
        assert_eq!(
            normalize_image_key("cover123.png"),
            "images/playlists/cover123.png"
        );
    }

    #[test]
    fn test_normalize_images_with_single_segment() {
        assert_eq!(
            normalize_image_key("images/abc.jpg"),
            "images/playlists/abc.jpg"
        );
    }

    #[test]
    fn test_normalize_canonical_passthrough() {
        assert_eq!(
            normalize_image_key("images/profiles/u1.png"),
            "images/profiles/u1.png"
        );
        assert_eq!(
            normalize_image_key("images/playlists/p1.jpg"),
            "images/playlists/p1.jpg"
        );
    }

    #[test]
    fn test_normalize_trims_and_strips_slashes() {
        assert_eq!(
            normalize_image_key("  /images/playlists/p1.jpg "),
            "images/playlists/p1.jpg"
        );
        assert_eq!(
            normalize_image_key("//cover.png"),
            "images/playlists/cover.png"
        );
    }

    #[test]
    fn test_normalize_unknown_folder_gets_images_prefix() {
        assert_eq!(
            normalize_image_key("uploads/old/pic.jpg"),
            "images/uploads/old/pic.jpg"
        );
    }

    #[test]
    fn test_normalize_idempotent() {
        // Canonical outputs are fixpoints. The profile rewrite output
        // (`images/<file>`) is the one deliberate exception, so it is
        // excluded here.
        let inputs = [
            "playlist-images/abc.jpg",
            "cover123.png",
            "images/abc.jpg",
            "images/profiles/u1.png",
            "images/playlists/p1.jpg",
            "uploads/old/pic.jpg",
            "  /padded.png ",
        ];
        for input in inputs {
            let once = normalize_image_key(input);
            assert_eq!(normalize_image_key(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_generate_track_key_shape() {
        let now = DateTime::parse_from_rfc3339("2024-03-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let key = generate_track_key(now, "My Song (final).WAV", "mp3");
        assert!(key.starts_with("tracks/2024/03/07/"), "key: {key}");
        assert!(key.ends_with("-My-Song--final-.mp3"), "key: {key}");
    }

    #[test]
    fn test_generate_track_key_unique() {
        let now = Utc::now();
        let a = generate_track_key(now, "song.mp3", "mp3");
        let b = generate_track_key(now, "song.mp3", "mp3");
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_track_key_strips_path_components() {
        let now = Utc::now();
        let key = generate_track_key(now, "../../etc/passwd", "mp3");
        assert!(!key.contains(".."), "key: {key}");
    }

    #[test]
    fn test_generate_image_key_shape() {
        let key = generate_image_key(ImageCategory::Playlists, "p1", "PNG");
        assert!(key.starts_with("images/playlists/p1-"), "key: {key}");
        assert!(key.ends_with(".png"), "key: {key}");

        let key = generate_image_key(ImageCategory::Profiles, "u1", "jpg");
        assert!(key.starts_with("images/profiles/u1-"), "key: {key}");
    }

    #[test]
    fn test_thumbnail_key() {
        assert_eq!(
            thumbnail_key("images/playlists/p1-abc.png"),
            "images/playlists/p1-abc_300x300.jpg"
        );
        assert_eq!(
            thumbnail_key("images/playlists/noext"),
            "images/playlists/noext_300x300.jpg"
        );
        // A dot in a folder name is not an extension separator.
        assert_eq!(
            thumbnail_key("images/v2.1/pic"),
            "images/v2.1/pic_300x300.jpg"
        );
    }
}
