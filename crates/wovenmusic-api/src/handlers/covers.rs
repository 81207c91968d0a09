//! Playlist cover resolution endpoints.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::state::{DbState, MediaState};
use wovenmusic_core::{constants::REDIRECT_CACHE_CONTROL, AppError};
use wovenmusic_storage::resolve::{extract_cover_candidate, resolve_cover_url};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CoverQuery {
    pub playlist_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoverUrlResponse {
    pub url: String,
}

async fn resolve_playlist_cover(
    db: &DbState,
    media: &MediaState,
    playlist_id: Uuid,
) -> Result<String, HttpAppError> {
    let playlist = db
        .playlists
        .get_playlist(playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;

    let candidate = extract_cover_candidate(&playlist).ok_or_else(|| {
        AppError::NotFound(format!("Playlist {} has no cover image", playlist_id))
    })?;

    Ok(resolve_cover_url(candidate, &media.cdn_base_url))
}

/// Redirect to the canonical cover image URL for a playlist
#[utoipa::path(
    get,
    path = "/cover-redirect",
    params(CoverQuery),
    responses(
        (status = 302, description = "Redirect to the canonical cover URL"),
        (status = 404, description = "Playlist not found or has no cover", body = crate::error::ErrorResponse)
    ),
    tag = "covers"
)]
pub async fn cover_redirect(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    Query(query): Query<CoverQuery>,
) -> Result<Response, HttpAppError> {
    let url = resolve_playlist_cover(&db, &media, query.playlist_id).await?;
    tracing::debug!(playlist_id = %query.playlist_id, url = %url, "Cover redirect");
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, url),
            (header::CACHE_CONTROL, REDIRECT_CACHE_CONTROL.to_string()),
        ],
    )
        .into_response())
}

/// Return the canonical cover image URL for a playlist as JSON
#[utoipa::path(
    get,
    path = "/cover-url",
    params(CoverQuery),
    responses(
        (status = 200, description = "Canonical cover URL", body = CoverUrlResponse),
        (status = 404, description = "Playlist not found or has no cover", body = crate::error::ErrorResponse)
    ),
    tag = "covers"
)]
pub async fn cover_url(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    Query(query): Query<CoverQuery>,
) -> Result<Response, HttpAppError> {
    let url = resolve_playlist_cover(&db, &media, query.playlist_id).await?;
    Ok((
        [(header::CACHE_CONTROL, REDIRECT_CACHE_CONTROL)],
        Json(CoverUrlResponse { url }),
    )
        .into_response())
}
