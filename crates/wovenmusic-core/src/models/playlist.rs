use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Playlist row.
///
/// Cover art went through several frontend generations before the storage
/// gateway existed, so the row carries one canonical column
/// (`cover_storage_key`) plus a tail of legacy columns that may hold a bare
/// key, a relative path, or a full URL. `cover_candidates()` exposes them in
/// resolution priority order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Canonical cover column, written by the gateway itself.
    pub cover_storage_key: Option<String>,

    // Legacy cover columns, written by older frontends. Never written by
    // the gateway, only read during candidate resolution.
    pub cover_key: Option<String>,
    pub image_key: Option<String>,
    pub artwork_key: Option<String>,
    pub cover_path: Option<String>,
    pub image_path: Option<String>,
    pub key: Option<String>,
    pub cover_image_url: Option<String>,
    pub image_url: Option<String>,
    pub cover_url: Option<String>,
    pub artwork_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub cover: Option<String>,
    pub image: Option<String>,
}

impl Playlist {
    /// Cover candidate values in priority order: canonical key first, then
    /// key-like legacy columns, then URL-like ones, then free-form ones.
    pub fn cover_candidates(&self) -> [Option<&str>; 14] {
        [
            self.cover_storage_key.as_deref(),
            self.cover_key.as_deref(),
            self.image_key.as_deref(),
            self.artwork_key.as_deref(),
            self.cover_path.as_deref(),
            self.image_path.as_deref(),
            self.key.as_deref(),
            self.cover_image_url.as_deref(),
            self.image_url.as_deref(),
            self.cover_url.as_deref(),
            self.artwork_url.as_deref(),
            self.thumbnail_url.as_deref(),
            self.cover.as_deref(),
            self.image.as_deref(),
        ]
    }
}
