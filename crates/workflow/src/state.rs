use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Where a submission is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SubmissionState {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// Attachments are being uploaded.
    Uploading,
    /// All uploads succeeded; the record is being written.
    Persisting,
    /// The record was persisted.
    Done,
    /// An upload or the record write failed.
    Failed,
}

/// Something that happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEvent {
    /// A new submission started.
    Submit,
    /// Every present upload returned a locator.
    UploadsSucceeded,
    /// An upload failed or was abandoned.
    UploadFailed,
    /// The record was written.
    PersistSucceeded,
    /// The record write failed or was abandoned.
    PersistFailed,
    /// The caller acknowledged a finished submission.
    Reset,
}

impl SubmissionState {
    /// Compute the state that follows `event`.
    ///
    /// Any pair not in the transition table is rejected with
    /// [`WorkflowError::InvalidTransition`]; `self` is left unchanged.
    pub fn apply(self, event: SubmissionEvent) -> Result<Self, WorkflowError> {
        use SubmissionEvent as E;
        use SubmissionState as S;

        match (self, event) {
            (S::Idle, E::Submit) => Ok(S::Uploading),
            (S::Uploading, E::UploadsSucceeded) => Ok(S::Persisting),
            (S::Uploading, E::UploadFailed) | (S::Persisting, E::PersistFailed) => Ok(S::Failed),
            (S::Persisting, E::PersistSucceeded) => Ok(S::Done),
            (S::Done | S::Failed, E::Reset) => Ok(S::Idle),
            (from, event) => Err(WorkflowError::InvalidTransition { from, event }),
        }
    }

    /// Returns `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Return the lowercase name used in logs and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SubmissionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submit => "submit",
            Self::UploadsSucceeded => "uploads_succeeded",
            Self::UploadFailed => "upload_failed",
            Self::PersistSucceeded => "persist_succeeded",
            Self::PersistFailed => "persist_failed",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}
