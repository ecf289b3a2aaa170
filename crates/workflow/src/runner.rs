use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use sweeplog_blob::AttachmentStore;
use sweeplog_core::{Locator, NewRecord, Record, Side};
use sweeplog_records::{RecordError, RecordStore};

use crate::error::WorkflowError;
use crate::state::{SubmissionEvent, SubmissionState};
use crate::submission::{ImageUpload, Submission};

/// Drives one session's submissions through [`SubmissionState`].
///
/// Uploads run concurrently and are joined before the single record write.
/// The first failed upload aborts the join; the sibling upload is dropped
/// and no record is created. Blobs that were stored before the failure are
/// left in place.
///
/// A `submit` future dropped before it finishes (a caller timeout, an
/// aborted task) leaves the workflow `Failed`, so it can be reset.
pub struct ReportWorkflow {
    attachments: Arc<dyn AttachmentStore>,
    records: Arc<dyn RecordStore>,
    state: Mutex<SubmissionState>,
    in_flight: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ReportWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportWorkflow")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ReportWorkflow {
    /// Create an idle workflow over the given stores.
    pub fn new(attachments: Arc<dyn AttachmentStore>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            attachments,
            records,
            state: Mutex::new(SubmissionState::Idle),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Current state.
    pub fn state(&self) -> SubmissionState {
        *self.state.lock()
    }

    /// Run a submission from `Idle` to `Done` or `Failed`.
    ///
    /// Fails with [`WorkflowError::Busy`] if another submission is running,
    /// and with [`WorkflowError::InvalidTransition`] if the workflow has not
    /// been reset since the last one finished.
    #[instrument(skip_all)]
    pub async fn submit(&self, submission: Submission) -> Result<Record, WorkflowError> {
        let _in_flight = self.in_flight.try_lock().map_err(|_| WorkflowError::Busy)?;
        self.transition(SubmissionEvent::Submit)?;
        // Declared after `_in_flight`, so it runs before the lock is released.
        let _abandoned = AbandonGuard { workflow: self };

        let Submission {
            before_note,
            after_note,
            before_image,
            after_image,
        } = submission;

        let uploads = tokio::try_join!(
            self.upload(Side::Before, before_image),
            self.upload(Side::After, after_image),
        );
        let (before, after) = match uploads {
            Ok(locators) => locators,
            Err(err) => {
                self.transition(SubmissionEvent::UploadFailed)?;
                return Err(err);
            }
        };
        self.transition(SubmissionEvent::UploadsSucceeded)?;

        let mut record = NewRecord::new()
            .with_before_note(before_note)
            .with_after_note(after_note);
        if let Some(locator) = before {
            record = record.with_attachment(Side::Before, locator);
        }
        if let Some(locator) = after {
            record = record.with_attachment(Side::After, locator);
        }

        match self.records.create(record).await {
            Ok(record) => {
                self.transition(SubmissionEvent::PersistSucceeded)?;
                info!(record_id = %record.id, "report persisted");
                Ok(record)
            }
            Err(err) => {
                error!(error = %err, "report persist failed");
                self.transition(SubmissionEvent::PersistFailed)?;
                Err(WorkflowError::Persist(err))
            }
        }
    }

    /// Return a finished workflow to `Idle`.
    pub fn reset(&self) -> Result<(), WorkflowError> {
        self.transition(SubmissionEvent::Reset).map(|_| ())
    }

    /// List every persisted report, newest first.
    pub async fn reports(&self) -> Result<Vec<Record>, RecordError> {
        self.records.list_all().await
    }

    fn transition(&self, event: SubmissionEvent) -> Result<SubmissionState, WorkflowError> {
        let mut state = self.state.lock();
        let from = *state;
        let next = from.apply(event)?;
        debug!(from = %from, event = %event, state = %next, "workflow transition");
        *state = next;
        Ok(next)
    }

    async fn upload(
        &self,
        side: Side,
        image: Option<ImageUpload>,
    ) -> Result<Option<Locator>, WorkflowError> {
        let Some(image) = image else {
            return Ok(None);
        };
        let size = image.data.len();
        match self.attachments.store(image.data, &image.name_hint).await {
            Ok(locator) => {
                debug!(side = %side, size, locator = %locator, "attachment uploaded");
                Ok(Some(locator))
            }
            Err(source) => {
                error!(side = %side, size, error = %source, "attachment upload failed");
                Err(WorkflowError::Upload { side, source })
            }
        }
    }
}

/// Fails a submission whose future was dropped mid-flight.
///
/// A no-op once `submit` has reached `Done` or `Failed` itself.
struct AbandonGuard<'a> {
    workflow: &'a ReportWorkflow,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.workflow.state.lock();
        let from = *state;
        let event = match from {
            SubmissionState::Uploading => SubmissionEvent::UploadFailed,
            // The record write may still commit on the backend.
            SubmissionState::Persisting => SubmissionEvent::PersistFailed,
            _ => return,
        };
        if let Ok(next) = from.apply(event) {
            warn!(from = %from, event = %event, "submission abandoned before completion");
            *state = next;
        }
    }
}
