use std::path::PathBuf;

use serde::Deserialize;
use sweeplog_blob::{DEFAULT_KEY_PREFIX, DEFAULT_MAX_SIZE_BYTES};

/// Top-level configuration for the Sweeplog server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct SweeplogConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store configuration.
    #[serde(default)]
    pub records: RecordsConfig,
    /// Attachment store configuration.
    #[serde(default)]
    pub attachments: AttachmentsConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this server, used to build locators for attachments it
    /// serves itself (e.g. `https://sweeplog.example.com`).
    ///
    /// If not set, defaults to `http://{host}:{port}`.
    pub external_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            external_url: None,
        }
    }
}

impl ServerConfig {
    /// The external URL, falling back to the bind address.
    pub fn external_url(&self) -> String {
        self.external_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

/// Record store configuration.
#[derive(Debug, Deserialize)]
pub struct RecordsConfig {
    /// Backend: `"memory"` or `"postgres"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Connection URL (postgres).
    pub url: Option<String>,
    /// Table name prefix.
    #[serde(default = "default_records_prefix")]
    pub prefix: String,
    /// Database schema.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// SSL mode (`disable`, `prefer`, `require`, `verify-ca`, `verify-full`).
    #[serde(default)]
    pub ssl_mode: Option<String>,
    /// CA certificate used to verify the server.
    #[serde(default)]
    pub ssl_root_cert: Option<String>,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            prefix: default_records_prefix(),
            schema: default_schema(),
            pool_size: default_pool_size(),
            ssl_mode: None,
            ssl_root_cert: None,
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_records_prefix() -> String {
    "sweeplog_".to_owned()
}

fn default_schema() -> String {
    "public".to_owned()
}

fn default_pool_size() -> u32 {
    5
}

/// Attachment store configuration.
#[derive(Debug, Deserialize)]
pub struct AttachmentsConfig {
    /// Backend: `"memory"`, `"fs"` or `"s3"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Prefix for generated object keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Largest accepted attachment, in bytes.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
    /// Root directory (fs).
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Base URL for issued locators. Defaults to this server's
    /// `/v1/attachments` route for `memory` and `fs`, and to the bucket URL
    /// for `s3`.
    pub public_base_url: Option<String>,
    /// Bucket name (s3).
    pub bucket: Option<String>,
    /// AWS region (s3).
    pub region: Option<String>,
    /// Endpoint override for S3-compatible services (s3).
    pub endpoint_url: Option<String>,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            key_prefix: default_key_prefix(),
            max_size_bytes: default_max_size_bytes(),
            directory: default_directory(),
            public_base_url: None,
            bucket: None,
            region: None,
            endpoint_url: None,
        }
    }
}

impl AttachmentsConfig {
    /// Largest request body the API accepts.
    ///
    /// A report carries up to two base64-encoded images (4/3 overhead each)
    /// plus notes, so allow three times the attachment limit and some slack.
    pub fn request_body_limit(&self) -> usize {
        let limit = self.max_size_bytes.saturating_mul(3).saturating_add(64 * 1024);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_owned()
}

fn default_max_size_bytes() -> u64 {
    DEFAULT_MAX_SIZE_BYTES
}

fn default_directory() -> PathBuf {
    PathBuf::from("./data/attachments")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: SweeplogConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.external_url(), "http://127.0.0.1:8080");
        assert_eq!(config.records.backend, "memory");
        assert_eq!(config.records.prefix, "sweeplog_");
        assert_eq!(config.records.pool_size, 5);
        assert!(config.records.ssl_mode.is_none());
        assert_eq!(config.attachments.backend, "memory");
        assert_eq!(config.attachments.key_prefix, "images");
        assert_eq!(config.attachments.max_size_bytes, 10_485_760);
    }

    #[test]
    fn full_file_parses() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            external_url = "https://sweeplog.example.com"

            [records]
            backend = "postgres"
            url = "postgres://localhost/sweeplog"
            prefix = "app_"
            pool_size = 10
            ssl_mode = "verify-full"
            ssl_root_cert = "/etc/ssl/certs/db-ca.pem"

            [attachments]
            backend = "s3"
            key_prefix = "photos"
            max_size_bytes = 2048
            bucket = "sweeplog"
            region = "eu-west-1"
            endpoint_url = "http://localhost:4566"
        "#;
        let config: SweeplogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.external_url(), "https://sweeplog.example.com");
        assert_eq!(config.records.backend, "postgres");
        assert_eq!(config.records.url.as_deref(), Some("postgres://localhost/sweeplog"));
        assert_eq!(config.records.schema, "public");
        assert_eq!(config.records.pool_size, 10);
        assert_eq!(config.records.ssl_mode.as_deref(), Some("verify-full"));
        assert_eq!(
            config.records.ssl_root_cert.as_deref(),
            Some("/etc/ssl/certs/db-ca.pem")
        );
        assert_eq!(config.attachments.bucket.as_deref(), Some("sweeplog"));
        assert_eq!(config.attachments.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.attachments.max_size_bytes, 2048);
    }

    #[test]
    fn body_limit_covers_two_encoded_images() {
        let config = AttachmentsConfig {
            max_size_bytes: 1000,
            ..AttachmentsConfig::default()
        };
        assert_eq!(config.request_body_limit(), 3000 + 64 * 1024);
    }
}
