use serde::{Deserialize, Serialize};
use sweeplog_blob::{DEFAULT_KEY_PREFIX, DEFAULT_MAX_SIZE_BYTES};

/// Configuration for the S3 attachment store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3AttachmentConfig {
    /// Bucket that holds the attachments.
    pub bucket: String,

    /// AWS region (e.g. `"us-east-1"`).
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override for S3-compatible services (e.g. `LocalStack`, `MinIO`).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing (`{endpoint}/{bucket}/{key}`).
    #[serde(default)]
    pub force_path_style: bool,

    /// Base URL for issued locators. Derived from the bucket when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Prefix prepended to every object key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Largest accepted payload, in bytes.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_owned()
}

fn default_max_size_bytes() -> u64 {
    DEFAULT_MAX_SIZE_BYTES
}

impl S3AttachmentConfig {
    /// Create a configuration for `bucket` in `us-east-1`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            public_base_url: None,
            key_prefix: default_key_prefix(),
            max_size_bytes: default_max_size_bytes(),
        }
    }

    /// Set the AWS region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the endpoint URL override. Also enables path-style addressing,
    /// which most S3-compatible services require.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self.force_path_style = true;
        self
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

    /// The base URL locators are issued under.
    ///
    /// An explicit `public_base_url` wins. Otherwise path-style endpoints
    /// yield `{endpoint}/{bucket}` and AWS yields the virtual-hosted form
    /// `https://{bucket}.s3.{region}.amazonaws.com`.
    pub fn locator_base(&self) -> String {
        if let Some(url) = &self.public_base_url {
            return url.clone();
        }
        match &self.endpoint_url {
            Some(endpoint) if self.force_path_style => {
                format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket)
            }
            _ => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = S3AttachmentConfig::new("sweeplog");
        assert_eq!(config.bucket, "sweeplog");
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
        assert!(!config.force_path_style);
        assert_eq!(config.key_prefix, "images");
        assert_eq!(config.max_size_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn aws_locator_base() {
        let config = S3AttachmentConfig::new("photos").with_region("eu-west-1");
        assert_eq!(
            config.locator_base(),
            "https://photos.s3.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn endpoint_locator_base_is_path_style() {
        let config = S3AttachmentConfig::new("photos").with_endpoint_url("http://localhost:4566/");
        assert!(config.force_path_style);
        assert_eq!(config.locator_base(), "http://localhost:4566/photos");
    }

    #[test]
    fn public_base_url_wins() {
        let config = S3AttachmentConfig::new("photos")
            .with_endpoint_url("http://localhost:4566")
            .with_public_base_url("https://cdn.example.com/attachments");
        assert_eq!(config.locator_base(), "https://cdn.example.com/attachments");
    }

    #[test]
    fn deserialize_minimal() {
        let config: S3AttachmentConfig =
            serde_json::from_str(r#"{"bucket": "sweeplog"}"#).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.key_prefix, "images");
        assert!(config.public_base_url.is_none());
    }
}
