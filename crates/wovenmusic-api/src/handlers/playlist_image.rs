//! Playlist cover upload: store the image, generate a thumbnail, and
//! record the canonical key on the playlist row.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::handlers::images::image_content_type;
use crate::services::covers::store_cover;
use crate::state::{DbState, MediaState};
use wovenmusic_core::AppError;
use wovenmusic_processing::MediaValidator;
use wovenmusic_storage::keys::ImageCategory;

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaylistImageResponse {
    pub cover_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_key: Option<String>,
}

struct PlaylistImageForm {
    data: Vec<u8>,
    filename: String,
    playlist_id: Uuid,
}

async fn read_playlist_image_form(
    mut multipart: Multipart,
) -> Result<PlaylistImageForm, HttpAppError> {
    let mut data = None;
    let mut filename = None;
    let mut playlist_id = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(|s| s.to_string());
                data = Some(field.bytes().await?.to_vec());
            }
            Some("playlistId") => {
                let text = field.text().await?;
                playlist_id = Some(text.parse::<Uuid>().map_err(|_| {
                    AppError::BadRequest("playlistId must be a UUID".to_string())
                })?);
            }
            _ => {}
        }
    }

    Ok(PlaylistImageForm {
        data: data
            .ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?,
        filename: filename
            .ok_or_else(|| AppError::BadRequest("Missing filename on 'file' field".to_string()))?,
        playlist_id: playlist_id
            .ok_or_else(|| AppError::BadRequest("Missing 'playlistId' field".to_string()))?,
    })
}

/// Upload a playlist cover image
#[utoipa::path(
    post,
    path = "/upload-playlist-image",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Cover stored", body = PlaylistImageResponse),
        (status = 400, description = "Invalid upload", body = crate::error::ErrorResponse),
        (status = 404, description = "Playlist not found", body = crate::error::ErrorResponse),
        (status = 413, description = "File too large", body = crate::error::ErrorResponse)
    ),
    tag = "covers"
)]
pub async fn upload_playlist_image(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    multipart: Multipart,
) -> Result<Json<PlaylistImageResponse>, HttpAppError> {
    let form = read_playlist_image_form(multipart).await?;

    db.playlists
        .get_playlist(form.playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", form.playlist_id)))?;

    let validator = MediaValidator::for_images(media.max_image_size_bytes);
    let extension = validator.validate(&form.filename, form.data.len())?;
    let content_type = image_content_type(&extension);

    let stored = store_cover(
        &media,
        ImageCategory::Playlists,
        form.playlist_id,
        &extension,
        content_type,
        form.data,
    )
    .await?;

    // Best-effort row update: the image is already stored and resolvable by
    // key, so a failed write must not fail the upload.
    match db
        .playlists
        .set_cover_storage_key(form.playlist_id, &stored.image_key)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(
                playlist_id = %form.playlist_id,
                "Playlist row disappeared before cover key update"
            );
        }
        Err(e) => {
            tracing::warn!(
                playlist_id = %form.playlist_id,
                error = %e,
                "Failed to record cover key on playlist"
            );
        }
    }

    Ok(Json(PlaylistImageResponse {
        cover_url: stored.image_url,
        thumb_url: stored.thumb_url,
        key: stored.image_key,
        thumb_key: stored.thumb_key,
    }))
}
