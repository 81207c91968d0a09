//! Cover image storage.
//!
//! Originals are stored under generated image keys; a 300x300 jpeg
//! thumbnail is produced alongside on a best-effort basis. A failed
//! thumbnail never fails the upload.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::MediaState;
use wovenmusic_core::AppError;
use wovenmusic_processing::generate_thumbnail;
use wovenmusic_storage::{
    keys::{generate_image_key, thumbnail_key, ImageCategory},
    resolve::encode_key_path,
    Storage,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct StoredCover {
    pub image_key: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
}

fn cdn_url(cdn_base_url: &str, key: &str) -> String {
    format!("{}/{}", cdn_base_url, encode_key_path(key))
}

/// Store a cover image and its thumbnail, returning keys and CDN URLs.
pub async fn store_cover(
    media: &MediaState,
    category: ImageCategory,
    entity_id: Uuid,
    extension: &str,
    content_type: &str,
    data: Vec<u8>,
) -> Result<StoredCover, AppError> {
    let image_key = generate_image_key(category, &entity_id.to_string(), extension);
    media
        .buckets
        .images
        .upload(&image_key, content_type, data.clone())
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let image_url = cdn_url(&media.cdn_base_url, &image_key);

    // Thumbnail is best-effort: a decode or upload failure is logged and
    // the original is still returned.
    let (thumb_key, thumb_url) = match generate_thumbnail(data).await {
        Ok(thumb_bytes) => {
            let key = thumbnail_key(&image_key);
            match media
                .buckets
                .images
                .upload(&key, "image/jpeg", thumb_bytes)
                .await
            {
                Ok(()) => {
                    let url = cdn_url(&media.cdn_base_url, &key);
                    (Some(key), Some(url))
                }
                Err(e) => {
                    tracing::warn!(
                        image_key = %image_key,
                        error = %e,
                        "Thumbnail upload failed, serving original only"
                    );
                    (None, None)
                }
            }
        }
        Err(e) => {
            tracing::warn!(
                image_key = %image_key,
                error = %e,
                "Thumbnail generation failed, serving original only"
            );
            (None, None)
        }
    };

    tracing::info!(
        image_key = %image_key,
        has_thumbnail = thumb_key.is_some(),
        "Cover image stored"
    );

    Ok(StoredCover {
        image_key,
        image_url,
        thumb_key,
        thumb_url,
    })
}
