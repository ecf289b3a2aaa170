use std::path::PathBuf;

use sweeplog_blob::{DEFAULT_KEY_PREFIX, DEFAULT_MAX_SIZE_BYTES};

/// Configuration for the filesystem attachment store.
#[derive(Debug, Clone)]
pub struct FsAttachmentConfig {
    /// Directory that holds the blobs. Created if missing.
    pub root: PathBuf,
    /// Base URL for issued locators. Defaults to `file://{root}`.
    pub public_base_url: Option<String>,
    /// Key prefix (a subdirectory of `root`).
    pub key_prefix: String,
    /// Largest accepted payload, in bytes.
    pub max_size_bytes: u64,
}

impl FsAttachmentConfig {
    /// Create a configuration rooted at `root` with default limits.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }

    /// Set the public base URL for locators.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the maximum payload size.
    #[must_use]
    pub fn with_max_size_bytes(mut self, max: u64) -> Self {
        self.max_size_bytes = max;
        self
    }
}
