//! Cover thumbnail generation.

use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageFormat;

use wovenmusic_core::constants::THUMBNAIL_SIZE;
use wovenmusic_core::AppError;

const JPEG_QUALITY: u8 = 85;

/// Produce a 300x300 center-cropped JPEG thumbnail from uploaded image bytes.
///
/// Decoding and resizing are CPU-bound, so the work runs on the blocking
/// pool. Callers treat failures as best-effort: a broken thumbnail never
/// fails the original upload.
pub async fn generate_thumbnail(data: Vec<u8>) -> Result<Vec<u8>, AppError> {
    tokio::task::spawn_blocking(move || thumbnail_blocking(&data))
        .await
        .map_err(|e| AppError::Internal(format!("Thumbnail task panicked: {}", e)))?
}

fn thumbnail_blocking(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::InvalidInput(format!("Failed to decode image: {}", e)))?;

    // resize_to_fill scales to cover the target box and center-crops the rest.
    let thumb = img.resize_to_fill(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    thumb
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| AppError::Internal(format!("Failed to encode thumbnail: {}", e)))?;

    Ok(out.into_inner())
}
