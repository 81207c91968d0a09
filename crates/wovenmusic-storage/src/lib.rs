//! Wovenmusic storage library
//!
//! Bucket abstraction and implementations for the gateway, plus the pure
//! key-handling layer: the legacy-key normalizer, the cover candidate
//! extractor, and the URL resolver.
//!
//! # Storage key format
//!
//! - **Cover images**: `images/{category}/{file}` where category is
//!   `playlists` or `profiles`.
//! - **Audio tracks**: `tracks/{yyyy}/{mm}/{dd}/{uuid}-{basename}.{ext}`.
//!
//! Keys never start with `/` and never contain `..`. Key generation and
//! normalization are centralized in the `keys` module so every consumer
//! agrees on one canonical shape.

pub mod factory;
pub mod keys;
pub mod local;
pub mod resolve;
pub mod s3;
pub mod traits;

pub use factory::{create_bucket, BucketSet};
pub use local::LocalBucket;
pub use s3::S3Bucket;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
pub use wovenmusic_core::StorageBackend;
