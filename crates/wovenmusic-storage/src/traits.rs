//! Storage abstraction trait
//!
//! This module defines the Storage trait that all bucket backends must implement.

use std::ops::Range;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use wovenmusic_core::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of object bytes, suitable for an HTTP response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// One instance is bound to one bucket; visibility partitioning is done by
/// holding separate instances (see `factory::BucketSet`). Keys are generated
/// by the `keys` module and passed in by the caller, never derived here.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `storage_key`, overwriting any existing object.
    async fn upload(&self, storage_key: &str, content_type: &str, data: Vec<u8>)
        -> StorageResult<()>;

    /// Read the whole object into memory.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Read the whole object as a stream of chunks.
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Read a byte range of the object. `range` is half-open (`start..end`)
    /// and must already be clamped to the object length by the caller.
    async fn download_range(&self, storage_key: &str, range: Range<u64>)
        -> StorageResult<ByteStream>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Check if an object exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Copy an object to another key within the same bucket. Used together
    /// with `delete` for explicit visibility transfers.
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
