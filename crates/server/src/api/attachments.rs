use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use sweeplog_blob::{guess_content_type, validate_key};

use super::AppState;
use super::schemas::{ErrorResponse, UploadResponse};
use crate::error::ServerError;

/// Query parameters for `POST /v1/attachments`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadParams {
    /// Original file name; only used to disambiguate the storage key.
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /v1/attachments` -- store the raw request body as a blob.
#[utoipa::path(
    post,
    path = "/v1/attachments",
    tag = "Attachments",
    summary = "Upload an attachment",
    params(UploadParams),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Attachment stored", body = UploadResponse),
        (status = 400, description = "Empty or oversized payload", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
    let hint = params.name.as_deref().unwrap_or("blob");
    let size = body.len();
    let locator = state.attachments.store(body, hint).await?;
    info!(locator = %locator, size, "attachment stored");
    Ok((StatusCode::CREATED, Json(UploadResponse { locator })))
}

/// `GET /v1/attachments/{key}` -- serve a blob stored by this server.
#[utoipa::path(
    get,
    path = "/v1/attachments/{key}",
    tag = "Attachments",
    summary = "Download an attachment",
    params(("key" = String, Path, description = "Storage key, e.g. `images/1700000000000-…-img1.png`")),
    responses(
        (status = 200, description = "Attachment bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 400, description = "Malformed key", body = ErrorResponse),
        (status = 404, description = "No blob under this key", body = ErrorResponse),
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    validate_key(&key)?;
    let locator = state.attachment_scheme.locate(&key);
    let data = state.attachments.fetch(&locator).await?;
    Ok(([(header::CONTENT_TYPE, guess_content_type(&key))], data))
}
