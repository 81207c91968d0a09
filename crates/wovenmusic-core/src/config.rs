//! Configuration module
//!
//! Environment-driven configuration for the gateway: server, database,
//! bucket bindings, auth, transcoder collaborator, and upload limits.

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_AUDIO_SIZE_MB: usize = 100;
const MAX_IMAGE_SIZE_MB: usize = 10;

/// Storage backend selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

/// Application configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    pub jwt_secret: String,

    pub storage_backend: StorageBackend,
    pub public_bucket: String,
    pub private_bucket: String,
    pub image_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,

    /// Public base for composing image URLs, e.g. `https://images.wovenmusic.app`
    pub cdn_base_url: String,
    /// Public base of the public audio bucket, e.g. `https://pub-xxxx.r2.dev`
    pub public_bucket_base_url: String,

    /// Transcoding collaborator; uploads of wav/aiff/flac fail with 415 when unset.
    pub transcoder_url: Option<String>,

    pub max_audio_size_bytes: usize,
    pub max_image_size_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 's3' or 'local', got '{}'",
                    other
                ))
            }
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            storage_backend,
            public_bucket: env::var("PUBLIC_BUCKET")
                .unwrap_or_else(|_| "wovenmusic-public".to_string()),
            private_bucket: env::var("PRIVATE_BUCKET")
                .unwrap_or_else(|_| "wovenmusic-private".to_string()),
            image_bucket: env::var("IMAGE_BUCKET")
                .unwrap_or_else(|_| "wovenmusic-images".to_string()),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            cdn_base_url: env::var("CDN_BASE_URL")
                .unwrap_or_else(|_| "https://images.wovenmusic.app".to_string())
                .trim_end_matches('/')
                .to_string(),
            public_bucket_base_url: env::var("PUBLIC_BUCKET_BASE_URL")
                .map_err(|_| anyhow::anyhow!("PUBLIC_BUCKET_BASE_URL must be set"))?
                .trim_end_matches('/')
                .to_string(),
            transcoder_url: env::var("TRANSCODER_URL").ok().filter(|s| !s.is_empty()),
            max_audio_size_bytes: env::var("MAX_AUDIO_SIZE_MB")
                .unwrap_or_else(|_| MAX_AUDIO_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_AUDIO_SIZE_MB)
                * 1024
                * 1024,
            max_image_size_bytes: env::var("MAX_IMAGE_SIZE_MB")
                .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_IMAGE_SIZE_MB)
                * 1024
                * 1024,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.s3_endpoint.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or S3_ENDPOINT must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
