use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use wovenmusic_core::StorageBackend;

use crate::traits::{ByteStream, Storage, StorageError, StorageResult};

/// Local filesystem bucket implementation
#[derive(Clone)]
pub struct LocalBucket {
    base_path: PathBuf,
    bucket: String,
}

impl LocalBucket {
    /// Create a new LocalBucket instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for all buckets (e.g., "/var/lib/wovenmusic/storage")
    /// * `bucket` - Bucket name; becomes a subdirectory under `base_path`
    pub async fn new(base_path: impl Into<PathBuf>, bucket: String) -> StorageResult<Self> {
        let base_path = base_path.into().join(&bucket);

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBucket { base_path, bucket })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Storage keys must not contain path traversal sequences that could
    /// escape the bucket directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside bucket directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalBucket {
    async fn upload(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn download_range(
        &self,
        storage_key: &str,
        range: Range<u64>,
    ) -> StorageResult<ByteStream> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let mut file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        file.seek(SeekFrom::Start(range.start)).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to seek in {}: {}", path.display(), e))
        })?;

        let limited = tokio::io::AsyncReadExt::take(file, range.end - range.start);
        let reader = tokio_util::io::ReaderStream::new(limited);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let meta = fs::metadata(&path)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(meta.len())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        let from_path = self.key_to_path(from_key)?;
        let to_path = self.key_to_path(to_key)?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(from_key.to_string()));
        }

        self.ensure_parent_dir(&to_path).await?;

        fs::copy(&from_path, &to_path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to copy {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            from_key = %from_key,
            to_key = %to_key,
            "Local storage copy successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn bucket(dir: &tempfile::TempDir) -> LocalBucket {
        LocalBucket::new(dir.path(), "test-bucket".to_string())
            .await
            .unwrap()
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        let data = b"test data".to_vec();
        storage
            .upload("images/playlists/p1.jpg", "image/jpeg", data.clone())
            .await
            .unwrap();

        let downloaded = storage.download("images/playlists/p1.jpg").await.unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        let result = storage.download("tracks/2024/01/01/missing.mp3").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let result = storage.content_length("tracks/2024/01/01/missing.mp3").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        assert!(storage.delete("nonexistent/file.mp3").await.is_ok());
    }

    #[tokio::test]
    async fn test_download_range() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        let data: Vec<u8> = (0..=255).collect();
        storage
            .upload("tracks/t.mp3", "audio/mpeg", data.clone())
            .await
            .unwrap();

        let ranged = collect(storage.download_range("tracks/t.mp3", 10..20).await.unwrap()).await;
        assert_eq!(ranged, &data[10..20]);

        let tail = collect(
            storage
                .download_range("tracks/t.mp3", 200..256)
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(tail, &data[200..256]);
    }

    #[tokio::test]
    async fn test_content_length() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        storage
            .upload("tracks/t.mp3", "audio/mpeg", vec![0u8; 1000])
            .await
            .unwrap();

        assert_eq!(storage.content_length("tracks/t.mp3").await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_copy() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        let data = b"original content".to_vec();
        storage
            .upload("tracks/a.mp3", "audio/mpeg", data.clone())
            .await
            .unwrap();

        storage.copy("tracks/a.mp3", "tracks/b.mp3").await.unwrap();
        assert_eq!(storage.download("tracks/b.mp3").await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_download_stream() {
        let dir = tempdir().unwrap();
        let storage = bucket(&dir).await;

        let data = b"stream download test".to_vec();
        storage
            .upload("tracks/s.mp3", "audio/mpeg", data.clone())
            .await
            .unwrap();

        let streamed = collect(storage.download_stream("tracks/s.mp3").await.unwrap()).await;
        assert_eq!(streamed, data);
    }
}
