use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use sweeplog_core::{NewRecord, Record, RecordId};
use sweeplog_records::{RecordError, RecordStore};

/// Source of commit timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    last_sequence: u64,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-memory record store. Suitable for development and testing; contents
/// are lost when the process exits.
///
/// Timestamp, sequence and insertion are assigned under one write lock, so
/// `created_at` never decreases in insertion order. A clock that steps
/// backwards is clamped to the last assigned timestamp.
pub struct MemoryRecordStore {
    inner: RwLock<Inner>,
    clock: Clock,
}

impl std::fmt::Debug for MemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecordStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    /// Create an empty store using the system clock.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock (tests use a frozen or scripted clock).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns `true` if no record has been created.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: NewRecord) -> Result<Record, RecordError> {
        let mut inner = self.inner.write();

        let now = (self.clock)();
        let created_at = match inner.last_created_at {
            Some(last) if now < last => last,
            _ => now,
        };
        inner.last_created_at = Some(created_at);
        inner.last_sequence += 1;

        let record = Record::from_new(record, RecordId::generate(), created_at, inner.last_sequence);
        inner.records.push(record.clone());

        debug!(id = %record.id, sequence = record.sequence, "created record in memory");
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<Record>, RecordError> {
        let mut records = self.inner.read().records.clone();
        records.sort_by(Record::newest_first);
        Ok(records)
    }
}
