use sweeplog_core::Locator;

use crate::error::BlobError;

/// Maps storage keys to public locators and back.
///
/// A locator is always `"{base}/{key}"`. The base is usually an HTTP(S)
/// URL that serves the blobs, but backends may use any scheme
/// (`memory://`, `file://`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorScheme {
    base: String,
}

impl LocatorScheme {
    /// Create a scheme rooted at `base`. A trailing `/` is ignored.
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Return the base URL without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Build the locator for a storage key.
    pub fn locate(&self, key: &str) -> Locator {
        Locator::new(format!("{}/{}", self.base, key.trim_start_matches('/')))
    }

    /// Recover the storage key from a locator issued by this scheme.
    pub fn key_of<'a>(&self, locator: &'a Locator) -> Result<&'a str, BlobError> {
        let key = locator
            .as_str()
            .strip_prefix(self.base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                BlobError::InvalidLocator(format!(
                    "{locator} is not under {base}",
                    base = self.base
                ))
            })?;
        validate_key(key)?;
        Ok(key)
    }
}

/// Reject keys that are empty or could escape the storage root.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    if key.is_empty() {
        return Err(BlobError::InvalidLocator("empty key".to_owned()));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(BlobError::InvalidLocator(format!("malformed key: {key}")));
    }
    Ok(())
}
