//! OpenAPI documentation

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::covers::cover_redirect,
        crate::handlers::covers::cover_url,
        crate::handlers::images::image_stream,
        crate::handlers::images::image_upload,
        crate::handlers::tracks::track_by_key,
        crate::handlers::tracks::track_stream,
        crate::handlers::tracks::track_url,
        crate::handlers::ingest::process_audio,
        crate::handlers::ingest::process_upload,
        crate::handlers::playlist_image::upload_playlist_image,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::covers::CoverUrlResponse,
        crate::handlers::tracks::TrackUrlResponse,
        crate::handlers::playlist_image::PlaylistImageResponse,
        crate::services::covers::StoredCover,
        crate::services::ingest::IngestOutcome,
        wovenmusic_core::models::Track,
        wovenmusic_core::models::Playlist,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "covers", description = "Cover image resolution and upload"),
        (name = "tracks", description = "Track streaming and URL resolution"),
        (name = "ingest", description = "Audio upload pipeline")
    ),
    info(
        title = "Wovenmusic Storage Gateway",
        description = "Storage-key resolution and streaming gateway for wovenmusic",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
