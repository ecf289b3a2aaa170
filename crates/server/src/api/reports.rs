//! The report workflow over HTTP: submit a report with inline photos, list
//! reports, and inspect a session's workflow state.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use sweeplog_core::{Record, Side};
use sweeplog_workflow::{ImageUpload, Submission, SubmissionState, WorkflowError};

use super::AppState;
use super::schemas::{ErrorResponse, ListRecordsResponse};
use crate::error::ServerError;
use crate::sessions::DEFAULT_SESSION;

/// Header that selects the caller's workflow session.
pub const SESSION_HEADER: &str = "x-session-id";

/// An inline photo.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImagePayload {
    /// Original file name.
    #[schema(example = "img1.png")]
    pub name: String,
    /// File contents, base64 (standard alphabet). A `data:` URL prefix is accepted.
    pub data_base64: String,
}

impl ImagePayload {
    fn decode(self, side: Side) -> Result<ImageUpload, ServerError> {
        let encoded = self
            .data_base64
            .split_once(";base64,")
            .map_or(self.data_base64.as_str(), |(_, data)| data);
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ServerError::BadRequest(format!("invalid base64 in {side}_image: {e}")))?;
        Ok(ImageUpload::new(data, self.name))
    }
}

/// Request body for `POST /v1/reports`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitReportRequest {
    /// Note describing the state before cleaning.
    #[serde(default)]
    pub before_note: String,
    /// Note describing the state after cleaning.
    #[serde(default)]
    pub after_note: String,
    /// Photo of the state before cleaning.
    #[serde(default)]
    pub before_image: Option<ImagePayload>,
    /// Photo of the state after cleaning.
    #[serde(default)]
    pub after_image: Option<ImagePayload>,
}

impl SubmitReportRequest {
    fn into_submission(self) -> Result<Submission, ServerError> {
        let mut submission = Submission::new()
            .with_before_note(self.before_note)
            .with_after_note(self.after_note);
        if let Some(image) = self.before_image {
            submission = submission.with_image(Side::Before, image.decode(Side::Before)?);
        }
        if let Some(image) = self.after_image {
            submission = submission.with_image(Side::After, image.decode(Side::After)?);
        }
        Ok(submission)
    }
}

/// Response for `GET /v1/reports/session`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionStateResponse {
    /// Session the state belongs to.
    #[schema(example = "default")]
    pub session_id: String,
    /// Workflow state; `idle` when no submission is running.
    pub state: SubmissionState,
}

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_owned()
}

/// `POST /v1/reports` -- upload both photos and persist the report.
#[utoipa::path(
    post,
    path = "/v1/reports",
    tag = "Reports",
    summary = "Submit a report",
    description = "Uploads the photos concurrently, then persists a single record referencing them. \
                   If any upload fails no record is written. The session's workflow is reset afterwards.",
    params(("x-session-id" = Option<String>, Header, description = "Workflow session (default: `default`)")),
    request_body(content = SubmitReportRequest, description = "Notes and inline photos"),
    responses(
        (status = 201, description = "Report persisted", body = Record),
        (status = 400, description = "Invalid image payload", body = ErrorResponse),
        (status = 409, description = "A submission is already running for this session", body = ErrorResponse),
        (status = 503, description = "Attachment or record store unavailable", body = ErrorResponse),
    )
)]
pub async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitReportRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let submission = req.into_submission()?;
    let session = session_id(&headers);
    let workflow = state.sessions.workflow(&session);

    // Detached so a dropped connection cannot leave the workflow mid-upload.
    let task_session = session.clone();
    let outcome = tokio::spawn(async move {
        let result = workflow.submit(submission).await;
        if !matches!(result, Err(WorkflowError::Busy))
            && let Err(e) = workflow.reset()
        {
            warn!(session_id = %task_session, error = %e, "failed to reset workflow");
        }
        result
    })
    .await;
    state.sessions.evict_idle(&session);

    let record = outcome.map_err(|e| ServerError::Internal(e.to_string()))??;
    info!(session_id = %session, record_id = %record.id, "report submitted");
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /v1/reports` -- list all reports, newest first.
#[utoipa::path(
    get,
    path = "/v1/reports",
    tag = "Reports",
    summary = "List reports",
    responses(
        (status = 200, description = "All reports, newest first", body = ListRecordsResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_reports(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let records = state.records.list_all().await?;
    Ok(Json(ListRecordsResponse::from(records)))
}

/// `GET /v1/reports/session` -- current workflow state for the session.
///
/// A session with no submission in flight reports `idle`.
#[utoipa::path(
    get,
    path = "/v1/reports/session",
    tag = "Reports",
    summary = "Get session workflow state",
    params(("x-session-id" = Option<String>, Header, description = "Workflow session (default: `default`)")),
    responses(
        (status = 200, description = "Workflow state", body = SessionStateResponse),
    )
)]
pub async fn session_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session_id = session_id(&headers);
    let state = state.sessions.state(&session_id);
    Json(SessionStateResponse { session_id, state })
}
