use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use sweeplog_blob::LocatorScheme;
use sweeplog_core::{Locator, NewRecord, Record, Side};

use super::AppState;
use super::schemas::{ErrorResponse, ListRecordsResponse};
use crate::error::ServerError;

/// Request body for creating a record from already-uploaded attachments.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateRecordRequest {
    /// Note describing the state before cleaning.
    #[serde(default)]
    pub before_note: String,
    /// Note describing the state after cleaning.
    #[serde(default)]
    pub after_note: String,
    /// Locator returned by `POST /v1/attachments` for the before photo.
    #[serde(default)]
    pub before_locator: Option<String>,
    /// Locator returned by `POST /v1/attachments` for the after photo.
    #[serde(default)]
    pub after_locator: Option<String>,
}

impl CreateRecordRequest {
    /// Build the record, keeping only locators issued by `scheme`.
    ///
    /// Blank locators mean "no attachment"; anything else must resolve to a
    /// key under `scheme`.
    fn into_new_record(self, scheme: &LocatorScheme) -> Result<NewRecord, ServerError> {
        let mut record = NewRecord::new()
            .with_before_note(self.before_note)
            .with_after_note(self.after_note);
        for (side, locator) in [
            (Side::Before, self.before_locator),
            (Side::After, self.after_locator),
        ] {
            if let Some(locator) = attachment_locator(scheme, locator)? {
                record = record.with_attachment(side, locator);
            }
        }
        Ok(record)
    }
}

fn attachment_locator(
    scheme: &LocatorScheme,
    locator: Option<String>,
) -> Result<Option<Locator>, ServerError> {
    let Some(locator) = locator.filter(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let locator = Locator::new(locator);
    scheme.key_of(&locator)?;
    Ok(Some(locator))
}

/// `POST /v1/records` -- persist a record.
#[utoipa::path(
    post,
    path = "/v1/records",
    tag = "Records",
    summary = "Create a record",
    description = "Persists a record. Attachments must already be uploaded; only their locators are stored.",
    request_body(content = CreateRecordRequest, description = "Record fields"),
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 400, description = "Locator not issued by this server's attachment store", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse),
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let new_record = req.into_new_record(&state.attachment_scheme)?;
    let record = state.records.create(new_record).await?;
    info!(record_id = %record.id, "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /v1/records` -- list all records, newest first.
#[utoipa::path(
    get,
    path = "/v1/records",
    tag = "Records",
    summary = "List records",
    responses(
        (status = 200, description = "All records, newest first", body = ListRecordsResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_records(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let records = state.records.list_all().await?;
    Ok(Json(ListRecordsResponse::from(records)))
}
