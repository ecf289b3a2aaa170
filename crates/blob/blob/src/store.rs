use async_trait::async_trait;
use bytes::Bytes;
use sweeplog_core::Locator;

use crate::error::BlobError;

/// Pluggable blob storage backend for report attachments.
///
/// Implementors provide the actual storage mechanism (memory, local disk,
/// S3). Implementations must be `Send + Sync` to be shared across tasks.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store a blob and return a locator that resolves to exactly these bytes.
    ///
    /// `name_hint` only disambiguates the storage key; every call yields a
    /// fresh locator and never overwrites an existing blob. Empty or
    /// oversized payloads fail with [`BlobError::InvalidPayload`]; backend
    /// failures with [`BlobError::StorageUnavailable`]. Nothing is retried.
    async fn store(&self, data: Bytes, name_hint: &str) -> Result<Locator, BlobError>;

    /// Fetch the bytes behind a locator previously returned by [`store`](Self::store).
    async fn fetch(&self, locator: &Locator) -> Result<Bytes, BlobError>;
}
