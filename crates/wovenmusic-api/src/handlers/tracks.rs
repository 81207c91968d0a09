//! Track streaming and URL resolution endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::OptionalAuthUser;
use crate::error::HttpAppError;
use crate::range::resolve_range;
use crate::services::ingest::audio_content_type;
use crate::state::{DbState, MediaState};
use wovenmusic_core::{
    constants::IMMUTABLE_CACHE_CONTROL,
    models::{StorageKind, Visibility},
    AppError,
};
use wovenmusic_storage::Storage;

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrackKeyQuery {
    pub key: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrackIdQuery {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackUrlResponse {
    pub url: String,
}

/// Serve an object with byte-range support.
///
/// A malformed or unsatisfiable Range header degrades to a full 200
/// response instead of a 416.
async fn stream_object(
    bucket: &Arc<dyn Storage>,
    storage_key: &str,
    range_header: Option<&str>,
    content_type: &str,
    cache_control: Option<&'static str>,
) -> Result<Response, HttpAppError> {
    let total = bucket.content_length(storage_key).await?;

    let mut response = match resolve_range(range_header, total) {
        Some(range) => {
            let stream = bucket
                .download_range(storage_key, range.start..range.end + 1)
                .await?;
            tracing::debug!(
                storage_key = storage_key,
                start = range.start,
                end = range.end,
                total = total,
                "Serving partial content"
            );
            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {}-{}/{}", range.start, range.end, total),
                    ),
                    (header::CONTENT_LENGTH, range.len().to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
        None => {
            let stream = bucket.download_stream(storage_key).await?;
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, total.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
    };

    if let Some(policy) = cache_control {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, header::HeaderValue::from_static(policy));
    }

    Ok(response)
}

fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::RANGE).and_then(|v| v.to_str().ok())
}

fn extension_of_key(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or("")
}

/// Content-Type for a stored track: recorded MIME first, then a guess
/// from the key extension (which itself defaults to `audio/mpeg`).
fn stream_content_type(mime: Option<&str>, storage_key: &str) -> String {
    match mime.filter(|m| !m.is_empty()) {
        Some(m) => m.to_string(),
        None => audio_content_type(extension_of_key(storage_key)).to_string(),
    }
}

/// Stream a public-bucket object by raw storage key
///
/// No authentication: this route only ever reads the public bucket, so
/// a key into the private bucket simply misses.
#[utoipa::path(
    get,
    path = "/track",
    params(TrackKeyQuery),
    responses(
        (status = 200, description = "Full audio content"),
        (status = 206, description = "Partial audio content"),
        (status = 404, description = "Object not found", body = crate::error::ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn track_by_key(
    State(media): State<MediaState>,
    Query(query): Query<TrackKeyQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let key = query.key.trim();
    if key.is_empty() {
        return Err(HttpAppError(AppError::BadRequest(
            "Missing 'key' parameter".to_string(),
        )));
    }

    // Keys embed a unique id, so bytes at a key never change.
    let content_type = audio_content_type(extension_of_key(key));
    stream_object(
        &media.buckets.public,
        key,
        range_header(&headers),
        content_type,
        Some(IMMUTABLE_CACHE_CONTROL),
    )
    .await
}

/// Stream a track by id with visibility and access checks
#[utoipa::path(
    get,
    path = "/track-stream",
    params(TrackIdQuery),
    responses(
        (status = 200, description = "Full audio content"),
        (status = 206, description = "Partial audio content"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::error::ErrorResponse),
        (status = 404, description = "Track not found", body = crate::error::ErrorResponse)
    ),
    tag = "tracks",
    security(("bearer_auth" = []))
)]
pub async fn track_stream(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Query(query): Query<TrackIdQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let track = db
        .tracks
        .get_track(query.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Track {} not found", query.id)))?;

    // External rows hold a direct URL and are redirected by /track-url,
    // never proxied here.
    if track.storage_kind() != Some(StorageKind::Bucket) {
        return Err(HttpAppError(AppError::NotFound(format!(
            "Track {} has no bucket-stored audio",
            query.id
        ))));
    }
    let storage_key = track
        .storage_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::NotFound(format!("Track {} has no stored audio", query.id)))?;

    let is_public = track.visibility() == Visibility::Public;
    if !is_public {
        let user = auth.as_ref().ok_or_else(|| {
            AppError::Unauthorized("Authentication required for private tracks".to_string())
        })?;
        let has_access = db
            .access
            .user_has_track_access(user.user_id, track.id)
            .await?;
        if !has_access {
            return Err(HttpAppError(AppError::Forbidden(format!(
                "No access to track {}",
                track.id
            ))));
        }
    }

    let content_type = stream_content_type(track.mime_type.as_deref(), storage_key);

    // Private streams carry no cache policy; shared caches must not hold them.
    let cache_control = is_public.then_some(IMMUTABLE_CACHE_CONTROL);
    let bucket = media.buckets.audio_bucket(is_public);
    stream_object(
        bucket,
        storage_key,
        range_header(&headers),
        &content_type,
        cache_control,
    )
    .await
}

/// Resolve a playable URL for a track
///
/// Public bucket tracks get a direct bucket URL, private tracks get a
/// proxy URL through `/track-stream` with the caller's token embedded
/// (media elements cannot set headers), and external tracks return
/// their stored URL verbatim.
#[utoipa::path(
    get,
    path = "/track-url",
    params(TrackIdQuery),
    responses(
        (status = 200, description = "Playable URL", body = TrackUrlResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::error::ErrorResponse),
        (status = 404, description = "Track not found or has no audio", body = crate::error::ErrorResponse)
    ),
    tag = "tracks",
    security(("bearer_auth" = []))
)]
pub async fn track_url(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Query(query): Query<TrackIdQuery>,
) -> Result<Json<TrackUrlResponse>, HttpAppError> {
    let track = db
        .tracks
        .get_track(query.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Track {} not found", query.id)))?;

    let url = match track.storage_kind() {
        Some(StorageKind::Bucket) => {
            let storage_key = track.storage_key.as_deref().ok_or_else(|| {
                AppError::NotFound(format!("Track {} has no storage key", query.id))
            })?;
            if track.visibility() == Visibility::Public {
                format!(
                    "{}/{}",
                    media.public_bucket_base_url.trim_end_matches('/'),
                    storage_key
                )
            } else {
                let user = auth.as_ref().ok_or_else(|| {
                    AppError::Unauthorized(
                        "Authentication required for private tracks".to_string(),
                    )
                })?;
                let has_access = db
                    .access
                    .user_has_track_access(user.user_id, track.id)
                    .await?;
                if !has_access {
                    return Err(HttpAppError(AppError::Forbidden(format!(
                        "No access to track {}",
                        track.id
                    ))));
                }
                format!("/track-stream?id={}&token={}", track.id, user.token)
            }
        }
        Some(StorageKind::External) => track
            .file_url
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("Track {} has no URL", query.id)))?,
        None => {
            return Err(HttpAppError(AppError::NotFound(format!(
                "Track {} has no stored audio",
                query.id
            ))));
        }
    };

    Ok(Json(TrackUrlResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_content_type_prefers_stored_mime() {
        assert_eq!(
            stream_content_type(Some("audio/ogg"), "tracks/a.m4a"),
            "audio/ogg"
        );
    }

    #[test]
    fn test_stream_content_type_guesses_from_key_extension() {
        assert_eq!(stream_content_type(None, "tracks/a.m4a"), "audio/mp4");
        assert_eq!(stream_content_type(Some(""), "tracks/a.aac"), "audio/aac");
        assert_eq!(stream_content_type(None, "tracks/a.flac"), "audio/flac");
    }

    #[test]
    fn test_stream_content_type_defaults_to_mpeg() {
        assert_eq!(stream_content_type(None, "tracks/mystery"), "audio/mpeg");
        assert_eq!(stream_content_type(None, "tracks/a.xyz"), "audio/mpeg");
    }
}
