use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use wovenmusic_core::{models::Track, AppError};

const TRACK_COLUMNS: &str = "id, playlist_id, title, artist, uploaded_by, is_public, \
     created_at, updated_at, storage_type, storage_key, storage_bucket, mime_type, \
     file_url, duration_seconds, file_size_bytes";

/// Repository for track rows
#[derive(Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get track by ID
    #[tracing::instrument(skip(self), fields(db.table = "tracks", db.operation = "select", db.record_id = %id))]
    pub async fn get_track(&self, id: Uuid) -> Result<Option<Track>, AppError> {
        let track = sqlx::query_as::<Postgres, Track>(&format!(
            "SELECT {} FROM tracks WHERE id = $1",
            TRACK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(track)
    }

    /// Record storage metadata after a successful ingest. Best-effort from
    /// the upload pipeline's point of view: the blob is already stored when
    /// this runs, and a failure here never undoes the upload.
    #[tracing::instrument(skip(self), fields(db.table = "tracks", db.operation = "update", db.record_id = %id))]
    pub async fn set_storage_metadata(
        &self,
        id: Uuid,
        storage_key: &str,
        storage_bucket: &str,
        mime_type: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tracks SET storage_type = 'bucket', storage_key = $2, \
             storage_bucket = $3, mime_type = $4, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(storage_key)
        .bind(storage_bucket)
        .bind(mime_type)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
