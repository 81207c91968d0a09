use axum::Json;
use serde_json::json;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
