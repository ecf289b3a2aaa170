use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use sweeplog_blob::BlobError;
use sweeplog_records::RecordError;
use sweeplog_workflow::WorkflowError;

/// Errors that can occur when running the Sweeplog server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An attachment store error.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// A record store error.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A report workflow error.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A background task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

fn blob_status(err: &BlobError) -> StatusCode {
    match err {
        BlobError::InvalidPayload(_) | BlobError::InvalidLocator(_) => StatusCode::BAD_REQUEST,
        BlobError::NotFound(_) => StatusCode::NOT_FOUND,
        BlobError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Blob(e) | Self::Workflow(WorkflowError::Upload { source: e, .. }) => {
                blob_status(e)
            }
            Self::Record(_) | Self::Workflow(WorkflowError::Persist(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Workflow(WorkflowError::Busy | WorkflowError::InvalidTransition { .. }) => {
                StatusCode::CONFLICT
            }
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
