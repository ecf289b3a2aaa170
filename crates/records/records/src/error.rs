/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The record could not be committed. Nothing became visible.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// The records could not be read. No partial result is returned.
    #[error("read failed: {0}")]
    ReadFailed(String),
}
