use thiserror::Error;

/// Errors that can occur during attachment storage operations.
///
/// None of these are retried by the store; the caller decides.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The payload was rejected before reaching the backend (empty or too large).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The backend could not be reached or failed the operation.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The locator is well-formed but no blob exists behind it.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The locator was not produced by this store.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),
}

impl BlobError {
    /// Build the `InvalidPayload` error for an oversized blob.
    pub fn too_large(size: u64, limit: u64) -> Self {
        Self::InvalidPayload(format!(
            "blob too large: {size} bytes exceeds limit of {limit} bytes"
        ))
    }
}
