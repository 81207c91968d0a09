use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthConfig;
use crate::services::ingest::TranscoderClient;
use wovenmusic_core::Config;
use wovenmusic_db::{AccessRepository, PlaylistRepository, TrackRepository};
use wovenmusic_storage::BucketSet;

/// Database-backed state: connection pool and repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub playlists: PlaylistRepository,
    pub tracks: TrackRepository,
    pub access: AccessRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            playlists: PlaylistRepository::new(pool.clone()),
            tracks: TrackRepository::new(pool.clone()),
            access: AccessRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Media state: storage buckets, URL roots, and ingest settings.
#[derive(Clone)]
pub struct MediaState {
    pub buckets: BucketSet,
    pub cdn_base_url: String,
    pub public_bucket_base_url: String,
    pub public_bucket_name: String,
    pub private_bucket_name: String,
    pub transcoder: Option<TranscoderClient>,
    pub max_audio_size_bytes: usize,
    pub max_image_size_bytes: usize,
}

impl MediaState {
    pub fn new(config: &Config, buckets: BucketSet) -> Self {
        Self {
            buckets,
            cdn_base_url: config.cdn_base_url.clone(),
            public_bucket_base_url: config.public_bucket_base_url.clone(),
            public_bucket_name: config.public_bucket.clone(),
            private_bucket_name: config.private_bucket.clone(),
            transcoder: config
                .transcoder_url
                .as_deref()
                .map(TranscoderClient::new),
            max_audio_size_bytes: config.max_audio_size_bytes,
            max_image_size_bytes: config.max_image_size_bytes,
        }
    }
}

/// Top-level application state shared across handlers.
pub struct AppState {
    pub db: DbState,
    pub media: MediaState,
    pub auth: AuthConfig,
    pub config: Config,
    pub is_production: bool,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, buckets: BucketSet) -> Self {
        let is_production = config.is_production();
        Self {
            db: DbState::new(pool),
            media: MediaState::new(&config, buckets),
            auth: AuthConfig::new(&config.jwt_secret),
            config,
            is_production,
        }
    }
}

impl FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl FromRef<Arc<AppState>> for AuthConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

#[allow(dead_code)]
fn _assert_app_state_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Arc<AppState>>();
}
