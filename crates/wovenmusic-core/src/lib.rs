//! Wovenmusic core library
//!
//! Shared foundation for the storage gateway: configuration, the unified
//! error taxonomy, and the playlist/track domain models.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

pub use config::{Config, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
