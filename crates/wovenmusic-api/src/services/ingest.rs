//! Audio ingest pipeline.
//!
//! Uploaded audio is either stored directly (formats browsers can play)
//! or sent to an external transcoder that converts it to mp3 before
//! storage. The gateway never transcodes in-process.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::MediaState;
use wovenmusic_core::{
    constants::{DIRECT_AUDIO_EXTENSIONS, TRANSCODE_AUDIO_EXTENSIONS},
    AppError,
};
use wovenmusic_storage::keys::generate_track_key;
use wovenmusic_storage::Storage;

/// What to do with an uploaded audio file, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestAction {
    /// Browser-playable format, store as-is.
    DirectStore,
    /// Lossless or legacy format, convert to mp3 first.
    Transcode,
    /// Not an audio format we accept.
    Unsupported,
}

pub fn classify_extension(extension: &str) -> IngestAction {
    let ext = extension.to_lowercase();
    if DIRECT_AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        IngestAction::DirectStore
    } else if TRANSCODE_AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        IngestAction::Transcode
    } else {
        IngestAction::Unsupported
    }
}

#[derive(Debug, Deserialize)]
struct TranscodeJobResponse {
    url: String,
}

/// Client for the external transcoding service.
///
/// The service accepts a multipart upload, converts it to mp3, and
/// responds with a URL where the converted bytes can be fetched.
#[derive(Clone)]
pub struct TranscoderClient {
    client: reqwest::Client,
    base_url: String,
}

impl TranscoderClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send audio bytes for conversion and fetch the mp3 result.
    pub async fn transcode_to_mp3(
        &self,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, AppError> {
        let start = std::time::Instant::now();
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| AppError::Internal(format!("Failed to build multipart part: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/transcode", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Transcoder request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamFailure(format!(
                "Transcoder returned status {}",
                response.status()
            )));
        }

        let job: TranscodeJobResponse = response.json().await.map_err(|e| {
            AppError::UpstreamFailure(format!("Invalid transcoder response: {}", e))
        })?;

        let converted = self
            .client
            .get(&job.url)
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Failed to fetch result: {}", e)))?;

        if !converted.status().is_success() {
            return Err(AppError::UpstreamFailure(format!(
                "Result fetch returned status {}",
                converted.status()
            )));
        }

        let bytes = converted
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Failed to read result: {}", e)))?;

        tracing::info!(
            filename = filename,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis(),
            "Transcode completed"
        );

        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestOutcome {
    pub storage_key: String,
    pub storage_bucket: String,
    pub transcoded: bool,
    /// Public URL for the stored file, only present for public uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Validate, optionally transcode, and store an uploaded audio file.
///
/// Returns the storage key and bucket the file landed in. `is_public`
/// selects the bucket; transcoded files always land as mp3.
pub async fn ingest_audio(
    media: &MediaState,
    filename: &str,
    extension: &str,
    data: Vec<u8>,
    is_public: bool,
) -> Result<IngestOutcome, AppError> {
    let action = classify_extension(extension);

    let (data, stored_ext, content_type, transcoded) = match action {
        IngestAction::DirectStore => {
            let content_type = audio_content_type(extension);
            (data, extension.to_lowercase(), content_type, false)
        }
        IngestAction::Transcode => {
            let Some(transcoder) = media.transcoder.as_ref() else {
                return Err(AppError::UnsupportedFormat(format!(
                    "Format '{}' requires transcoding but no transcoder is configured",
                    extension
                )));
            };
            let converted = transcoder.transcode_to_mp3(filename, data).await?;
            (converted, "mp3".to_string(), "audio/mpeg", true)
        }
        IngestAction::Unsupported => {
            return Err(AppError::UnsupportedFormat(format!(
                "Unsupported audio format '{}'",
                extension
            )));
        }
    };

    let storage_key = generate_track_key(Utc::now(), filename, &stored_ext);
    let bucket = media.buckets.audio_bucket(is_public);
    bucket
        .upload(&storage_key, content_type, data)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let bucket_name = if is_public {
        media.public_bucket_name.clone()
    } else {
        media.private_bucket_name.clone()
    };

    let url = is_public.then(|| {
        format!(
            "{}/{}",
            media.public_bucket_base_url.trim_end_matches('/'),
            storage_key
        )
    });

    tracing::info!(
        storage_key = %storage_key,
        bucket = %bucket_name,
        transcoded = transcoded,
        "Audio ingested"
    );

    Ok(IngestOutcome {
        storage_key,
        storage_bucket: bucket_name,
        transcoded,
        url,
    })
}

/// Content type for a direct-store audio extension.
pub fn audio_content_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "audio/mpeg",
    }
}
