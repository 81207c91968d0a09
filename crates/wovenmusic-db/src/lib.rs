//! Wovenmusic database library
//!
//! Repositories over the playlist and track tables, plus the track access
//! capability check. All queries are runtime-checked against a `PgPool`.

pub mod access;
pub mod playlist;
pub mod track;

pub use access::AccessRepository;
pub use playlist::PlaylistRepository;
pub use track::TrackRepository;
