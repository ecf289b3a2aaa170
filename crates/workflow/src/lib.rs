//! The report submission workflow.
//!
//! A submission uploads up to two photos concurrently, then persists a
//! single record that references them. [`SubmissionState`] is the pure
//! state machine; [`ReportWorkflow`] drives it against the stores.

pub mod error;
pub mod runner;
pub mod state;
pub mod submission;

pub use error::WorkflowError;
pub use runner::ReportWorkflow;
pub use state::{SubmissionEvent, SubmissionState};
pub use submission::{ImageUpload, Submission};
