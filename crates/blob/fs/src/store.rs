//! Attachment storage on the local filesystem.
//!
//! Blobs live at `{root}/{key}`. Each write goes to a private temp file
//! under `{root}/.incoming`, is flushed to disk, and is then hard-linked
//! into place. Linking fails if the target exists, so a key is never
//! overwritten and a reader never observes a partially written blob.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use sweeplog_blob::{AttachmentStore, BlobError, BlobLimits, KeyGenerator, LocatorScheme};
use sweeplog_core::Locator;

use crate::config::FsAttachmentConfig;

const INCOMING_DIR: &str = ".incoming";

/// Filesystem-backed [`AttachmentStore`].
#[derive(Debug)]
pub struct FsAttachmentStore {
    root: PathBuf,
    keys: KeyGenerator,
    scheme: LocatorScheme,
    limits: BlobLimits,
}

impl FsAttachmentStore {
    /// Create the store, ensuring the root directory exists.
    pub async fn new(config: &FsAttachmentConfig) -> Result<Self, BlobError> {
        fs::create_dir_all(config.root.join(INCOMING_DIR))
            .await
            .map_err(|e| unavailable(&config.root, &e))?;
        let root = fs::canonicalize(&config.root)
            .await
            .map_err(|e| unavailable(&config.root, &e))?;

        let base = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("file://{}", root.display()));

        info!(path = %root.display(), base = %base, "initialized filesystem attachment store");

        Ok(Self {
            root,
            keys: KeyGenerator::new(config.key_prefix.clone()),
            scheme: LocatorScheme::new(base),
            limits: BlobLimits::new(config.max_size_bytes),
        })
    }

    /// Return the canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<(), BlobError> {
        let tmp = self
            .root
            .join(INCOMING_DIR)
            .join(uuid::Uuid::new_v4().simple().to_string());

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)
            .await
            .map_err(|e| unavailable(&tmp, &e))?;
        file.write_all(data)
            .await
            .map_err(|e| unavailable(&tmp, &e))?;
        file.sync_all().await.map_err(|e| unavailable(&tmp, &e))?;
        drop(file);

        let linked = fs::hard_link(&tmp, path).await;
        if let Err(e) = fs::remove_file(&tmp).await {
            warn!(path = %tmp.display(), error = %e, "failed to remove temp attachment file");
        }
        linked.map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                BlobError::StorageUnavailable(format!("key collision: {}", path.display()))
            } else {
                unavailable(path, &e)
            }
        })
    }
}

fn unavailable(path: &Path, err: &std::io::Error) -> BlobError {
    BlobError::StorageUnavailable(format!("{}: {err}", path.display()))
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn store(&self, data: Bytes, name_hint: &str) -> Result<Locator, BlobError> {
        self.limits.validate(&data)?;

        let key = self.keys.generate(name_hint);
        let path = self.blob_path(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable(parent, &e))?;
        }

        self.write_new(&path, &data).await?;

        debug!(key = %key, "stored attachment on disk");
        Ok(self.scheme.locate(&key))
    }

    #[instrument(skip(self), fields(locator = %locator))]
    async fn fetch(&self, locator: &Locator) -> Result<Bytes, BlobError> {
        let key = self.scheme.key_of(locator)?;
        let path = self.blob_path(key);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            // A key that names a directory (such as a key prefix) holds no blob.
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                Err(BlobError::NotFound(locator.to_string()))
            }
            Err(e) => Err(unavailable(&path, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use sweeplog_blob::testing::run_attachment_store_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(&FsAttachmentConfig::new(dir.path()))
            .await
            .unwrap();
        run_attachment_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn default_locator_is_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(&FsAttachmentConfig::new(dir.path()))
            .await
            .unwrap();

        let locator = store
            .store(Bytes::from_static(b"png"), "img1.png")
            .await
            .unwrap();
        assert!(locator.as_str().starts_with("file://"));

        let key = LocatorScheme::new(format!("file://{}", store.root().display()))
            .key_of(&locator)
            .unwrap()
            .to_owned();
        let on_disk = std::fs::read(store.root().join(key)).unwrap();
        assert_eq!(on_disk, b"png");
    }

    #[tokio::test]
    async fn public_base_url_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let config = FsAttachmentConfig::new(dir.path())
            .with_public_base_url("http://localhost:8080/v1/attachments");
        let store = FsAttachmentStore::new(&config).await.unwrap();

        let locator = store
            .store(Bytes::from_static(b"data"), "a.png")
            .await
            .unwrap();
        assert!(
            locator
                .as_str()
                .starts_with("http://localhost:8080/v1/attachments/images/")
        );
        assert_eq!(store.fetch(&locator).await.unwrap(), Bytes::from_static(b"data"));
    }

    #[tokio::test]
    async fn directory_keys_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(&FsAttachmentConfig::new(dir.path()))
            .await
            .unwrap();
        let locator = store.store(Bytes::from_static(b"x"), "x.png").await.unwrap();
        let base = format!("file://{}", store.root().display());

        for key in ["images", INCOMING_DIR] {
            let result = store.fetch(&Locator::new(format!("{base}/{key}"))).await;
            assert!(
                matches!(result, Err(BlobError::NotFound(_))),
                "{key}: {result:?}"
            );
        }
        assert_eq!(store.fetch(&locator).await.unwrap(), Bytes::from_static(b"x"));
    }

    #[tokio::test]
    async fn temp_files_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(&FsAttachmentConfig::new(dir.path()))
            .await
            .unwrap();
        store.store(Bytes::from_static(b"x"), "x").await.unwrap();

        let leftovers = std::fs::read_dir(store.root().join(INCOMING_DIR))
            .unwrap()
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn blobs_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = FsAttachmentConfig::new(dir.path());

        let locator = {
            let store = FsAttachmentStore::new(&config).await.unwrap();
            store
                .store(Bytes::from_static(b"durable"), "d.png")
                .await
                .unwrap()
        };

        let reopened = FsAttachmentStore::new(&config).await.unwrap();
        assert_eq!(
            reopened.fetch(&locator).await.unwrap(),
            Bytes::from_static(b"durable")
        );
    }
}
