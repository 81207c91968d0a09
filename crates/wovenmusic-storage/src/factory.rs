use std::sync::Arc;

use wovenmusic_core::{Config, StorageBackend};

use crate::local::LocalBucket;
use crate::s3::S3Bucket;
use crate::traits::{Storage, StorageError, StorageResult};

/// The gateway's three bucket bindings: the two audio visibility partitions
/// plus the cover image bucket.
#[derive(Clone)]
pub struct BucketSet {
    pub public: Arc<dyn Storage>,
    pub private: Arc<dyn Storage>,
    pub images: Arc<dyn Storage>,
}

impl BucketSet {
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        Ok(BucketSet {
            public: create_bucket(config, &config.public_bucket).await?,
            private: create_bucket(config, &config.private_bucket).await?,
            images: create_bucket(config, &config.image_bucket).await?,
        })
    }

    /// Bucket holding audio for the given visibility flag.
    pub fn audio_bucket(&self, is_public: bool) -> &Arc<dyn Storage> {
        if is_public {
            &self.public
        } else {
            &self.private
        }
    }

    /// Bucket name recorded on the entity row at upload time.
    pub fn audio_bucket_name(config: &Config, is_public: bool) -> String {
        if is_public {
            config.public_bucket.clone()
        } else {
            config.private_bucket.clone()
        }
    }
}

/// Create a single bucket binding based on configuration.
pub async fn create_bucket(config: &Config, bucket: &str) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let storage = S3Bucket::new(
                bucket.to_string(),
                config.s3_region.clone(),
                config.s3_endpoint.clone(),
            )?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let storage = LocalBucket::new(base_path, bucket.to_string()).await?;
            Ok(Arc::new(storage))
        }
    }
}
