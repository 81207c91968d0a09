use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Where a track's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Bytes live in one of our buckets under `storage_key`.
    Bucket,
    /// Bytes live at an external URL (`file_url`); we never proxy these.
    External,
}

/// Track visibility; selects which bucket holds the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Track row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Track {
    pub id: Uuid,
    pub playlist_id: Option<Uuid>,
    pub title: String,
    pub artist: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// "bucket" or "external"; older rows may be NULL (treated as bucket
    /// when `storage_key` is present).
    pub storage_type: Option<String>,
    pub storage_key: Option<String>,
    /// Bucket name recorded at upload time; informational, the gateway picks
    /// the bucket from `is_public`.
    pub storage_bucket: Option<String>,
    pub mime_type: Option<String>,
    /// External playback URL for `storage_type = "external"` rows.
    pub file_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub file_size_bytes: Option<i64>,
}

impl Track {
    pub fn storage_kind(&self) -> Option<StorageKind> {
        match self.storage_type.as_deref() {
            Some("external") => Some(StorageKind::External),
            Some("bucket") => Some(StorageKind::Bucket),
            // Legacy rows predate the storage_type column.
            None if self.storage_key.is_some() => Some(StorageKind::Bucket),
            None if self.file_url.is_some() => Some(StorageKind::External),
            _ => None,
        }
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}
