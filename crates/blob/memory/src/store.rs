use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use sweeplog_blob::{AttachmentStore, BlobError, BlobLimits, KeyGenerator, LocatorScheme};
use sweeplog_core::Locator;

/// Locator base used when none is configured.
pub const DEFAULT_MEMORY_BASE: &str = "memory://attachments";

/// In-memory [`AttachmentStore`] using `DashMap`. Suitable for development
/// and testing; contents are lost when the process exits.
#[derive(Debug)]
pub struct MemoryAttachmentStore {
    blobs: DashMap<String, Bytes>,
    keys: KeyGenerator,
    scheme: LocatorScheme,
    limits: BlobLimits,
}

impl Default for MemoryAttachmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAttachmentStore {
    /// Create a new, empty store with default limits and the
    /// `memory://attachments` locator base.
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
            keys: KeyGenerator::default(),
            scheme: LocatorScheme::new(DEFAULT_MEMORY_BASE),
            limits: BlobLimits::default(),
        }
    }

    /// Issue locators under a different base (e.g. the server's public URL).
    #[must_use]
    pub fn with_scheme(mut self, scheme: LocatorScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set the payload limits.
    #[must_use]
    pub fn with_limits(mut self, limits: BlobLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.keys = KeyGenerator::new(prefix);
        self
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if no blob has been stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn store(&self, data: Bytes, name_hint: &str) -> Result<Locator, BlobError> {
        self.limits.validate(&data)?;

        let key = self.keys.generate(name_hint);
        let size = data.len();
        match self.blobs.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(BlobError::StorageUnavailable(format!(
                    "key collision: {key}"
                )));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(data);
            }
        }

        debug!(key = %key, size, "stored attachment in memory");
        Ok(self.scheme.locate(&key))
    }

    async fn fetch(&self, locator: &Locator) -> Result<Bytes, BlobError> {
        let key = self.scheme.key_of(locator)?;
        self.blobs
            .get(key)
            .map(|blob| blob.value().clone())
            .ok_or_else(|| BlobError::NotFound(locator.to_string()))
    }
}
