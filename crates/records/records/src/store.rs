use async_trait::async_trait;
use sweeplog_core::{NewRecord, Record};

use crate::error::RecordError;

/// Durable, append-only collection of cleaning report records.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return it with its assigned `id`,
    /// `created_at` and `sequence`.
    ///
    /// The write is atomic: on error nothing is visible to [`list_all`](Self::list_all).
    /// Identical calls produce distinct records.
    async fn create(&self, record: NewRecord) -> Result<Record, RecordError>;

    /// Return every record, newest first (see [`Record::newest_first`]).
    async fn list_all(&self) -> Result<Vec<Record>, RecordError>;
}
