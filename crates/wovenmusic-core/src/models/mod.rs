pub mod playlist;
pub mod track;

pub use playlist::Playlist;
pub use track::{StorageKind, Track, Visibility};
