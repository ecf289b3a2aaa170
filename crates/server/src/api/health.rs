use axum::Json;
use axum::response::IntoResponse;

use super::schemas::HealthResponse;

/// `GET /health` -- liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
