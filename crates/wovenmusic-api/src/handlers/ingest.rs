//! Audio upload endpoints.

use axum::{
    extract::{Multipart, State},
    Json,
};
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::services::ingest::{ingest_audio, IngestOutcome};
use crate::state::{DbState, MediaState};
use wovenmusic_core::AppError;
use wovenmusic_processing::{extension_of, MediaValidator};

struct AudioUploadForm {
    data: Vec<u8>,
    filename: String,
    is_public: bool,
    track_id: Option<Uuid>,
}

async fn read_audio_upload_form(mut multipart: Multipart) -> Result<AudioUploadForm, HttpAppError> {
    let mut data = None;
    let mut field_filename = None;
    let mut explicit_filename = None;
    let mut visibility = None;
    let mut track_id = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("audio") => {
                field_filename = field.file_name().map(|s| s.to_string());
                data = Some(field.bytes().await?.to_vec());
            }
            Some("fileName") => explicit_filename = Some(field.text().await?),
            Some("visibility") => visibility = Some(field.text().await?),
            Some("trackId") => {
                let text = field.text().await?;
                track_id = Some(text.parse::<Uuid>().map_err(|_| {
                    AppError::BadRequest("trackId must be a UUID".to_string())
                })?);
            }
            _ => {}
        }
    }

    let is_public = match visibility.as_deref() {
        None | Some("public") => true,
        Some("private") => false,
        Some(other) => {
            return Err(HttpAppError(AppError::BadRequest(format!(
                "Unknown visibility '{}', expected 'public' or 'private'",
                other
            ))));
        }
    };

    // An explicit fileName field wins over the multipart filename; some
    // clients send blobs without one.
    let filename = explicit_filename
        .or(field_filename)
        .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?;

    Ok(AudioUploadForm {
        data: data
            .ok_or_else(|| AppError::BadRequest("Missing 'audio' field".to_string()))?,
        filename,
        is_public,
        track_id,
    })
}

async fn run_ingest(
    db: &DbState,
    media: &MediaState,
    form: AudioUploadForm,
) -> Result<Json<IngestOutcome>, HttpAppError> {
    // Size is checked here; the extension decision (direct store, transcode,
    // or 415) belongs to the ingest pipeline.
    let validator = MediaValidator::for_audio(media.max_audio_size_bytes);
    validator.validate_file_size(form.data.len())?;
    let extension = extension_of(&form.filename)
        .ok_or_else(|| AppError::BadRequest("Filename has no extension".to_string()))?;

    let outcome = ingest_audio(media, &form.filename, &extension, form.data, form.is_public).await?;

    // Best-effort metadata write: the file is already stored, so a failed
    // row update must not fail the upload.
    if let Some(track_id) = form.track_id {
        let stored_ext = outcome.storage_key.rsplit('.').next().unwrap_or("mp3");
        let mime_type = crate::services::ingest::audio_content_type(stored_ext);
        let result = db
            .tracks
            .set_storage_metadata(track_id, &outcome.storage_key, &outcome.storage_bucket, mime_type)
            .await;
        if let Err(e) = result {
            tracing::warn!(
                track_id = %track_id,
                error = %e,
                "Failed to record storage metadata on track"
            );
        }
    }

    Ok(Json(outcome))
}

/// Upload and ingest an audio file
#[utoipa::path(
    post,
    path = "/process-audio",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Audio stored", body = IngestOutcome),
        (status = 400, description = "Invalid upload", body = crate::error::ErrorResponse),
        (status = 413, description = "File too large", body = crate::error::ErrorResponse),
        (status = 415, description = "Unsupported audio format", body = crate::error::ErrorResponse),
        (status = 502, description = "Transcoder failure", body = crate::error::ErrorResponse)
    ),
    tag = "ingest"
)]
pub async fn process_audio(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    multipart: Multipart,
) -> Result<Json<IngestOutcome>, HttpAppError> {
    let form = read_audio_upload_form(multipart).await?;
    run_ingest(&db, &media, form).await
}

/// Upload and ingest an audio file (legacy route)
#[utoipa::path(
    post,
    path = "/process-upload",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Audio stored", body = IngestOutcome),
        (status = 400, description = "Invalid upload", body = crate::error::ErrorResponse),
        (status = 413, description = "File too large", body = crate::error::ErrorResponse),
        (status = 415, description = "Unsupported audio format", body = crate::error::ErrorResponse),
        (status = 502, description = "Transcoder failure", body = crate::error::ErrorResponse)
    ),
    tag = "ingest"
)]
pub async fn process_upload(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    multipart: Multipart,
) -> Result<Json<IngestOutcome>, HttpAppError> {
    let form = read_audio_upload_form(multipart).await?;
    run_ingest(&db, &media, form).await
}
