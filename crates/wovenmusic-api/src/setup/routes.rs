//! Route configuration and setup

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use wovenmusic_core::Config;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/cover-redirect", get(handlers::covers::cover_redirect))
        .route("/cover-url", get(handlers::covers::cover_url))
        .route("/image-stream", get(handlers::images::image_stream))
        .route("/image-upload", post(handlers::images::image_upload))
        .route("/track", get(handlers::tracks::track_by_key))
        .route("/track-stream", get(handlers::tracks::track_stream))
        .route("/track-url", get(handlers::tracks::track_url))
        .route("/process-audio", post(handlers::ingest::process_audio))
        .route("/process-upload", post(handlers::ingest::process_upload))
        .route(
            "/upload-playlist-image",
            post(handlers::playlist_image::upload_playlist_image),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .layer(RequestBodyLimitLayer::new(
            config.max_audio_size_bytes.max(config.max_image_size_bytes) + 1024 * 1024,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
