//! Shared constants for key handling, caching, and ingest routing.

/// Cache policy for cover redirects; short because covers can be replaced.
pub const REDIRECT_CACHE_CONTROL: &str = "public, max-age=300";

/// Cache policy for streamed image bytes; keys embed a unique id so content
/// at a given key never changes.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Audio extensions stored as-is, already browser-playable.
pub const DIRECT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a"];

/// Audio extensions that must go through the transcoding collaborator.
pub const TRANSCODE_AUDIO_EXTENSIONS: &[&str] = &["wav", "aif", "aiff", "flac"];

/// Host suffixes that mark a URL as pointing at our own object storage.
pub const OWN_STORAGE_HOST_SUFFIXES: &[&str] = &[".r2.dev", ".r2.cloudflarestorage.com"];

/// Suffix appended to an image key stem for its 300x300 thumbnail.
pub const THUMBNAIL_SUFFIX: &str = "_300x300";

/// Thumbnail edge length in pixels.
pub const THUMBNAIL_SIZE: u32 = 300;
