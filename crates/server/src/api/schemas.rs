use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use sweeplog_core::{Locator, Record};

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    #[schema(example = "ok")]
    pub status: String,
}

/// Generic error response returned on failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "blob not found: http://localhost:8080/v1/attachments/images/x.png")]
    pub error: String,
}

/// Response for a stored attachment.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Locator that resolves to the stored bytes.
    #[schema(value_type = String)]
    pub locator: Locator,
}

/// Response for listing records, newest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsResponse {
    /// Records ordered by `created_at` descending, then `sequence` descending.
    pub records: Vec<Record>,
    /// Number of records returned.
    pub count: usize,
}

impl From<Vec<Record>> for ListRecordsResponse {
    fn from(records: Vec<Record>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}
