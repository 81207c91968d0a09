use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use wovenmusic_core::{models::Playlist, AppError};

const PLAYLIST_COLUMNS: &str = "id, name, created_by, is_public, created_at, updated_at, \
     cover_storage_key, cover_key, image_key, artwork_key, cover_path, image_path, key, \
     cover_image_url, image_url, cover_url, artwork_url, thumbnail_url, cover, image";

/// Repository for playlist rows
#[derive(Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

impl PlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get playlist by ID
    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "select", db.record_id = %id))]
    pub async fn get_playlist(&self, id: Uuid) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<Postgres, Playlist>(&format!(
            "SELECT {} FROM playlists WHERE id = $1",
            PLAYLIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(playlist)
    }

    /// Record a freshly uploaded cover on the canonical column.
    ///
    /// Only `cover_storage_key` is written; legacy columns are read-only
    /// from the gateway's point of view. Returns false when the playlist
    /// does not exist.
    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "update", db.record_id = %id))]
    pub async fn set_cover_storage_key(&self, id: Uuid, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE playlists SET cover_storage_key = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
