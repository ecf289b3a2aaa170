use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, error, info, instrument};

use sweeplog_blob::{
    AttachmentStore, BlobError, BlobLimits, KeyGenerator, LocatorScheme, guess_content_type,
};
use sweeplog_core::Locator;

use crate::config::S3AttachmentConfig;

/// [`AttachmentStore`] backed by an S3-compatible bucket.
pub struct S3AttachmentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    keys: KeyGenerator,
    scheme: LocatorScheme,
    limits: BlobLimits,
}

impl std::fmt::Debug for S3AttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3AttachmentStore")
            .field("bucket", &self.bucket)
            .field("scheme", &self.scheme)
            .field("client", &"<S3Client>")
            .finish_non_exhaustive()
    }
}

impl S3AttachmentStore {
    /// Build a store using the standard AWS credential chain.
    pub async fn new(config: &S3AttachmentConfig) -> Self {
        let mut loader =
            aws_config::from_env().region(aws_config::Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            debug!(endpoint = %endpoint, "using custom S3 endpoint");
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);

        info!(bucket = %config.bucket, region = %config.region, "initialized S3 attachment store");
        Self::with_client(config, client)
    }

    /// Build a store around a pre-built client.
    pub fn with_client(config: &S3AttachmentConfig, client: aws_sdk_s3::Client) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            keys: KeyGenerator::new(config.key_prefix.clone()),
            scheme: LocatorScheme::new(config.locator_base()),
            limits: BlobLimits::new(config.max_size_bytes),
        }
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    async fn store(&self, data: Bytes, name_hint: &str) -> Result<Locator, BlobError> {
        self.limits.validate(&data)?;

        let key = self.keys.generate(name_hint);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .if_none_match("*")
            .content_type(guess_content_type(name_hint))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(error = %err_str, key = %key, "S3 put_object failed");
                BlobError::StorageUnavailable(err_str)
            })?;

        debug!(key = %key, "stored attachment in S3");
        Ok(self.scheme.locate(&key))
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, locator = %locator))]
    async fn fetch(&self, locator: &Locator) -> Result<Bytes, BlobError> {
        let key = self.scheme.key_of(locator)?;

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    BlobError::NotFound(locator.to_string())
                } else {
                    let err_str = e.to_string();
                    error!(error = %err_str, key = %key, "S3 get_object failed");
                    BlobError::StorageUnavailable(err_str)
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::StorageUnavailable(format!("failed to read S3 body: {e}")))?;
        Ok(body.into_bytes())
    }
}
