use std::sync::Arc;

use sweeplog_blob::{AttachmentStore, BlobLimits, LocatorScheme};
use sweeplog_blob_fs::{FsAttachmentConfig, FsAttachmentStore};
use sweeplog_blob_memory::MemoryAttachmentStore;
#[cfg(feature = "s3")]
use sweeplog_blob_s3::{S3AttachmentConfig, S3AttachmentStore};

use crate::config::{AttachmentsConfig, ServerConfig};
use crate::error::ServerError;

/// Route under which the server serves attachments itself.
pub const ATTACHMENTS_ROUTE: &str = "/v1/attachments";

/// Build the S3 configuration from the `[attachments]` section.
#[cfg(feature = "s3")]
fn s3_config(config: &AttachmentsConfig) -> Result<S3AttachmentConfig, ServerError> {
    let bucket = config.bucket.as_deref().ok_or_else(|| {
        ServerError::Config("s3 attachment backend requires [attachments] bucket".into())
    })?;

    let mut s3 = S3AttachmentConfig::new(bucket)
        .with_key_prefix(&config.key_prefix)
        .with_max_size_bytes(config.max_size_bytes);
    if let Some(region) = &config.region {
        s3 = s3.with_region(region);
    }
    if let Some(endpoint) = &config.endpoint_url {
        s3 = s3.with_endpoint_url(endpoint);
    }
    if let Some(url) = &config.public_base_url {
        s3 = s3.with_public_base_url(url);
    }
    Ok(s3)
}

/// The base URL locators are issued under for the configured backend.
///
/// `GET /v1/attachments/{key}` resolves keys against this base, so it must
/// match what the store itself uses.
pub fn locator_scheme(
    config: &AttachmentsConfig,
    server: &ServerConfig,
) -> Result<LocatorScheme, ServerError> {
    #[cfg(feature = "s3")]
    if config.backend == "s3" {
        return Ok(LocatorScheme::new(s3_config(config)?.locator_base()));
    }

    let base = config.public_base_url.clone().unwrap_or_else(|| {
        format!(
            "{}{ATTACHMENTS_ROUTE}",
            server.external_url().trim_end_matches('/')
        )
    });
    Ok(LocatorScheme::new(base))
}

/// Create an attachment store from the given configuration.
pub async fn create_attachment_store(
    config: &AttachmentsConfig,
    server: &ServerConfig,
) -> Result<Arc<dyn AttachmentStore>, ServerError> {
    let scheme = locator_scheme(config, server)?;

    let store: Arc<dyn AttachmentStore> = match config.backend.as_str() {
        "memory" => Arc::new(
            MemoryAttachmentStore::new()
                .with_scheme(scheme)
                .with_key_prefix(&config.key_prefix)
                .with_limits(BlobLimits::new(config.max_size_bytes)),
        ),
        "fs" => {
            let fs_config = FsAttachmentConfig::new(&config.directory)
                .with_public_base_url(scheme.base())
                .with_key_prefix(&config.key_prefix)
                .with_max_size_bytes(config.max_size_bytes);

            let store = FsAttachmentStore::new(&fs_config)
                .await
                .map_err(|e| ServerError::Config(format!("attachments fs: {e}")))?;

            Arc::new(store)
        }
        #[cfg(feature = "s3")]
        "s3" => Arc::new(S3AttachmentStore::new(&s3_config(config)?).await),
        #[cfg(not(feature = "s3"))]
        "s3" => {
            return Err(ServerError::Config(
                "attachment backend s3 requires building with the `s3` feature".into(),
            ));
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported attachment backend: {other}"
            )));
        }
    };

    Ok(store)
}
