use crate::error::BlobError;

/// Default maximum attachment size (10 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Size limits applied to every payload before it reaches a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobLimits {
    /// Largest accepted payload, in bytes.
    pub max_size_bytes: u64,
}

impl Default for BlobLimits {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl BlobLimits {
    /// Create limits with the given maximum size.
    pub fn new(max_size_bytes: u64) -> Self {
        Self { max_size_bytes }
    }

    /// Reject empty payloads and payloads above `max_size_bytes`.
    pub fn validate(&self, data: &[u8]) -> Result<(), BlobError> {
        if data.is_empty() {
            return Err(BlobError::InvalidPayload("payload is empty".to_owned()));
        }
        let size = data.len() as u64;
        if size > self.max_size_bytes {
            return Err(BlobError::too_large(size, self.max_size_bytes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_rejected() {
        let err = BlobLimits::default().validate(b"").unwrap_err();
        assert!(matches!(err, BlobError::InvalidPayload(_)));
    }

    #[test]
    fn payload_at_limit_accepted() {
        let limits = BlobLimits::new(4);
        assert!(limits.validate(b"abcd").is_ok());
    }

    #[test]
    fn payload_over_limit_rejected() {
        let limits = BlobLimits::new(4);
        let err = limits.validate(b"abcde").unwrap_err();
        assert!(err.to_string().contains("5 bytes exceeds limit of 4 bytes"));
    }
}
