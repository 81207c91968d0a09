pub mod covers;
pub mod health;
pub mod images;
pub mod ingest;
pub mod playlist_image;
pub mod tracks;
