use sweeplog_blob::BlobError;
use sweeplog_core::Side;
use sweeplog_records::RecordError;

use crate::state::{SubmissionEvent, SubmissionState};

/// Errors returned by the report workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Another submission is already running on this workflow.
    #[error("a submission is already in progress")]
    Busy,

    /// The event is not valid in the current state.
    #[error("invalid transition: {event} in state {from}")]
    InvalidTransition {
        from: SubmissionState,
        event: SubmissionEvent,
    },

    /// An attachment upload failed; no record was written.
    #[error("{side} upload failed: {source}")]
    Upload {
        side: Side,
        #[source]
        source: BlobError,
    },

    /// The record write failed after all uploads succeeded.
    #[error("persist failed: {0}")]
    Persist(#[source] RecordError),
}
