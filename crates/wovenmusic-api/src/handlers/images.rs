//! Generic image endpoints: key-based resolution and direct image upload.

use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::services::covers::{store_cover, StoredCover};
use crate::state::{DbState, MediaState};
use wovenmusic_core::{constants::REDIRECT_CACHE_CONTROL, AppError};
use wovenmusic_processing::MediaValidator;
use wovenmusic_storage::keys::ImageCategory;
use wovenmusic_storage::resolve::{extract_cover_candidate, resolve_cover_url};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ImageStreamQuery {
    /// Raw storage key or legacy URL; takes priority over `playlist_id`.
    pub key: Option<String>,
    pub playlist_id: Option<Uuid>,
}

/// Redirect to the canonical URL for an image key or playlist cover
#[utoipa::path(
    get,
    path = "/image-stream",
    params(ImageStreamQuery),
    responses(
        (status = 302, description = "Redirect to the canonical image URL"),
        (status = 400, description = "Neither key nor playlist_id provided", body = crate::error::ErrorResponse),
        (status = 404, description = "Playlist not found or has no cover", body = crate::error::ErrorResponse)
    ),
    tag = "covers"
)]
pub async fn image_stream(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    Query(query): Query<ImageStreamQuery>,
) -> Result<Response, HttpAppError> {
    let url = if let Some(key) = query.key.as_deref().filter(|k| !k.trim().is_empty()) {
        resolve_cover_url(key.trim(), &media.cdn_base_url)
    } else if let Some(playlist_id) = query.playlist_id {
        let playlist = db
            .playlists
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;
        let candidate = extract_cover_candidate(&playlist).ok_or_else(|| {
            AppError::NotFound(format!("Playlist {} has no cover image", playlist_id))
        })?;
        resolve_cover_url(candidate, &media.cdn_base_url)
    } else {
        return Err(HttpAppError(AppError::BadRequest(
            "Either 'key' or 'playlist_id' must be provided".to_string(),
        )));
    };

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, url),
            (header::CACHE_CONTROL, REDIRECT_CACHE_CONTROL.to_string()),
        ],
    )
        .into_response())
}

struct ImageUploadForm {
    data: Vec<u8>,
    filename: String,
    entity_type: String,
    entity_id: String,
}

async fn read_image_upload_form(mut multipart: Multipart) -> Result<ImageUploadForm, HttpAppError> {
    let mut data = None;
    let mut filename = None;
    let mut entity_type = None;
    let mut entity_id = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(|s| s.to_string());
                data = Some(field.bytes().await?.to_vec());
            }
            Some("entityType") => entity_type = Some(field.text().await?),
            Some("entityId") => entity_id = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(ImageUploadForm {
        data: data
            .ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?,
        filename: filename
            .ok_or_else(|| AppError::BadRequest("Missing filename on 'file' field".to_string()))?,
        entity_type: entity_type
            .ok_or_else(|| AppError::BadRequest("Missing 'entityType' field".to_string()))?,
        entity_id: entity_id
            .ok_or_else(|| AppError::BadRequest("Missing 'entityId' field".to_string()))?,
    })
}

pub(crate) fn image_content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Upload an image for a playlist or profile
#[utoipa::path(
    post,
    path = "/image-upload",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = StoredCover),
        (status = 400, description = "Invalid upload", body = crate::error::ErrorResponse),
        (status = 413, description = "File too large", body = crate::error::ErrorResponse)
    ),
    tag = "covers"
)]
pub async fn image_upload(
    State(media): State<MediaState>,
    multipart: Multipart,
) -> Result<Json<StoredCover>, HttpAppError> {
    let form = read_image_upload_form(multipart).await?;

    let category = match form.entity_type.as_str() {
        "playlist" => ImageCategory::Playlists,
        "profile" => ImageCategory::Profiles,
        other => {
            return Err(HttpAppError(AppError::BadRequest(format!(
                "Unknown entityType '{}', expected 'playlist' or 'profile'",
                other
            ))));
        }
    };

    let entity_id: Uuid = form
        .entity_id
        .parse()
        .map_err(|_| AppError::BadRequest("entityId must be a UUID".to_string()))?;

    let validator = MediaValidator::for_images(media.max_image_size_bytes);
    let extension = validator.validate(&form.filename, form.data.len())?;
    let content_type = image_content_type(&extension);

    let stored = store_cover(
        &media,
        category,
        entity_id,
        &extension,
        content_type,
        form.data,
    )
    .await?;

    Ok(Json(stored))
}
