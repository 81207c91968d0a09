//! Endpoint tests against an in-process server with local disk buckets.
//!
//! These tests avoid the database: the pool is connected lazily and only
//! routes that never touch a repository are exercised here.

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;

use wovenmusic_api::setup::routes::setup_routes;
use wovenmusic_api::state::AppState;
use wovenmusic_core::{Config, StorageBackend};
use wovenmusic_storage::BucketSet;

fn test_config(storage_root: &TempDir) -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgresql://localhost:5432/wovenmusic_test".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        jwt_secret: "test-secret-test-secret-test-secret!".to_string(),
        storage_backend: StorageBackend::Local,
        public_bucket: "public".to_string(),
        private_bucket: "private".to_string(),
        image_bucket: "images".to_string(),
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some(storage_root.path().to_string_lossy().to_string()),
        cdn_base_url: "https://cdn.test".to_string(),
        public_bucket_base_url: "https://pub.test".to_string(),
        transcoder_url: None,
        max_audio_size_bytes: 100 * 1024 * 1024,
        max_image_size_bytes: 10 * 1024 * 1024,
    }
}

async fn test_server(storage_root: &TempDir) -> (TestServer, BucketSet) {
    let config = test_config(storage_root);
    let buckets = BucketSet::from_config(&config)
        .await
        .expect("create buckets");

    // Lazy pool: no connection is made until a repository is used.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    let state = Arc::new(AppState::new(config.clone(), pool, buckets.clone()));
    let router = setup_routes(&config, state).expect("router");
    (TestServer::new(router).expect("test server"), buckets)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_track_full_download() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    let data = vec![7u8; 1000];
    buckets
        .public
        .upload("tracks/2024/01/01/x-song.mp3", "audio/mpeg", data.clone())
        .await
        .expect("upload");

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/2024/01/01/x-song.mp3")
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().len(), 1000);
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(response.header("content-type"), "audio/mpeg");
    assert_eq!(
        response.header("cache-control"),
        "public, max-age=31536000, immutable"
    );
}

#[tokio::test]
async fn test_track_prefix_range() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
    buckets
        .public
        .upload("tracks/a.mp3", "audio/mpeg", data.clone())
        .await
        .expect("upload");

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/a.mp3")
        .add_header("range", "bytes=0-99")
        .await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 0-99/1000");
    assert_eq!(response.as_bytes().len(), 100);
    assert_eq!(response.as_bytes().as_ref(), &data[0..100]);
}

#[tokio::test]
async fn test_track_open_ended_range() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
    buckets
        .public
        .upload("tracks/b.mp3", "audio/mpeg", data.clone())
        .await
        .expect("upload");

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/b.mp3")
        .add_header("range", "bytes=500-")
        .await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 500-999/1000");
    assert_eq!(response.as_bytes().as_ref(), &data[500..1000]);
}

#[tokio::test]
async fn test_track_malformed_range_serves_full() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    buckets
        .public
        .upload("tracks/c.mp3", "audio/mpeg", vec![1u8; 300])
        .await
        .expect("upload");

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/c.mp3")
        .add_header("range", "bytes=abc")
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().len(), 300);
}

#[tokio::test]
async fn test_track_unsatisfiable_range_serves_full() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    buckets
        .public
        .upload("tracks/d.mp3", "audio/mpeg", vec![1u8; 300])
        .await
        .expect("upload");

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/d.mp3")
        .add_header("range", "bytes=300-")
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().len(), 300);
}

#[tokio::test]
async fn test_track_missing_object_is_404() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/nope.mp3")
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_track_content_type_by_extension() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    buckets
        .public
        .upload("tracks/e.m4a", "audio/mp4", vec![1u8; 10])
        .await
        .expect("upload");

    let response = server
        .get("/track")
        .add_query_param("key", "tracks/e.m4a")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "audio/mp4");
}

#[tokio::test]
async fn test_image_stream_by_key_redirects_to_canonical_url() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let response = server
        .get("/image-stream")
        .add_query_param("key", "playlist-images/abc.jpg")
        .await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(
        response.header("location"),
        "https://cdn.test/images/playlists/abc.jpg"
    );
    assert_eq!(response.header("cache-control"), "public, max-age=300");
}

#[tokio::test]
async fn test_image_stream_requires_key_or_playlist_id() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let response = server.get("/image-stream").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_image_upload_stores_original_and_thumbnail() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    let entity_id = uuid::Uuid::new_v4();
    let form = MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(png_bytes(600, 400)).file_name("cover.png"),
        )
        .add_text("entityType", "playlist")
        .add_text("entityId", entity_id.to_string());

    let response = server.post("/image-upload").multipart(form).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let image_key = body["image_key"].as_str().expect("image_key");
    assert!(image_key.starts_with("images/playlists/"));
    assert!(image_key.ends_with(".png"));
    assert_eq!(
        body["image_url"].as_str().expect("image_url"),
        format!("https://cdn.test/{}", image_key)
    );

    let thumb_key = body["thumb_key"].as_str().expect("thumb_key");
    assert!(thumb_key.ends_with("_300x300.jpg"));

    assert!(buckets.images.exists(image_key).await.expect("exists"));
    assert!(buckets.images.exists(thumb_key).await.expect("exists"));
}

#[tokio::test]
async fn test_image_upload_stores_original_when_thumbnail_fails() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    // Valid extension but bytes no decoder accepts: thumbnailing fails,
    // the original upload still succeeds without thumb fields.
    let form = MultipartForm::new()
        .add_part("file", Part::bytes(vec![0u8; 64]).file_name("cover.png"))
        .add_text("entityType", "playlist")
        .add_text("entityId", uuid::Uuid::new_v4().to_string());

    let response = server.post("/image-upload").multipart(form).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let image_key = body["image_key"].as_str().expect("image_key");
    assert!(image_key.ends_with(".png"));
    assert_eq!(
        body["image_url"].as_str().expect("image_url"),
        format!("https://cdn.test/{}", image_key)
    );
    assert!(body["thumb_key"].is_null());
    assert!(body["thumb_url"].is_null());

    assert!(buckets.images.exists(image_key).await.expect("exists"));
}

#[tokio::test]
async fn test_image_upload_rejects_unknown_entity_type() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(png_bytes(10, 10)).file_name("a.png"))
        .add_text("entityType", "album")
        .add_text("entityId", uuid::Uuid::new_v4().to_string());

    let response = server.post("/image-upload").multipart(form).await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_image_upload_rejects_bad_extension() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(vec![0u8; 10]).file_name("a.exe"))
        .add_text("entityType", "playlist")
        .add_text("entityId", uuid::Uuid::new_v4().to_string());

    let response = server.post("/image-upload").multipart(form).await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_process_audio_direct_store() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    let form = MultipartForm::new()
        .add_part(
            "audio",
            Part::bytes(vec![0xFFu8; 2048]).file_name("My Song.mp3"),
        )
        .add_text("visibility", "public");

    let response = server.post("/process-audio").multipart(form).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let storage_key = body["storage_key"].as_str().expect("storage_key");
    assert!(storage_key.starts_with("tracks/"));
    assert!(storage_key.ends_with(".mp3"));
    assert_eq!(body["transcoded"], false);
    assert_eq!(body["storage_bucket"], "public");
    assert_eq!(
        body["url"].as_str().expect("url"),
        format!("https://pub.test/{}", storage_key)
    );

    assert!(buckets.public.exists(storage_key).await.expect("exists"));
}

#[tokio::test]
async fn test_process_audio_private_goes_to_private_bucket() {
    let dir = TempDir::new().expect("tempdir");
    let (server, buckets) = test_server(&dir).await;

    let form = MultipartForm::new()
        .add_part("audio", Part::bytes(vec![1u8; 512]).file_name("demo.m4a"))
        .add_text("visibility", "private");

    let response = server.post("/process-audio").multipart(form).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["storage_bucket"], "private");
    assert!(body.get("url").is_none() || body["url"].is_null());

    let storage_key = body["storage_key"].as_str().expect("storage_key");
    assert!(buckets.private.exists(storage_key).await.expect("exists"));
    assert!(!buckets.public.exists(storage_key).await.expect("exists"));
}

#[tokio::test]
async fn test_process_audio_transcode_without_transcoder_is_415() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let form = MultipartForm::new()
        .add_part("audio", Part::bytes(vec![1u8; 512]).file_name("take.wav"))
        .add_text("visibility", "public");

    let response = server.post("/process-audio").multipart(form).await;
    assert_eq!(response.status_code(), 415);
}

#[tokio::test]
async fn test_process_audio_unsupported_format() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let form = MultipartForm::new()
        .add_part("audio", Part::bytes(vec![1u8; 512]).file_name("notes.txt"))
        .add_text("visibility", "public");

    let response = server.post("/process-audio").multipart(form).await;
    assert_eq!(response.status_code(), 415);
}

#[tokio::test]
async fn test_track_stream_requires_auth_for_missing_token() {
    // A private track lookup would hit the database; instead verify that
    // an invalid bearer token is rejected before any database access.
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let response = server
        .get("/track-stream")
        .add_query_param("id", uuid::Uuid::new_v4().to_string())
        .add_header("authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_openapi_spec_served() {
    let dir = TempDir::new().expect("tempdir");
    let (server, _) = test_server(&dir).await;

    let response = server.get("/api/openapi.json").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["paths"].get("/track-stream").is_some());
}
