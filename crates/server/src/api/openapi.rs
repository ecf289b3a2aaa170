#![allow(clippy::needless_for_each)]

use sweeplog_core::{AttachmentRef, NewRecord, Record, Side};
use sweeplog_workflow::SubmissionState;

use super::records::CreateRecordRequest;
use super::reports::{ImagePayload, SessionStateResponse, SubmitReportRequest};
use super::schemas::{ErrorResponse, HealthResponse, ListRecordsResponse, UploadResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Sweeplog API",
        version = "0.1.0",
        description = "HTTP API for recording before/after cleaning reports with photo attachments.",
        license(name = "MIT")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Attachments", description = "Blob storage for report photos"),
        (name = "Records", description = "Persisted report records"),
        (name = "Reports", description = "Upload-then-persist submission workflow")
    ),
    paths(
        super::health::health,
        super::attachments::upload,
        super::attachments::download,
        super::records::create_record,
        super::records::list_records,
        super::reports::submit_report,
        super::reports::list_reports,
        super::reports::session_state,
    ),
    components(schemas(
        Record, NewRecord, AttachmentRef, Side,
        SubmissionState,
        HealthResponse, ErrorResponse, UploadResponse, ListRecordsResponse,
        CreateRecordRequest,
        SubmitReportRequest, ImagePayload, SessionStateResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/v1/attachments",
            "/v1/attachments/{key}",
            "/v1/records",
            "/v1/reports",
            "/v1/reports/session",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
