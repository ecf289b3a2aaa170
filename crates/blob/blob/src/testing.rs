use bytes::Bytes;
use sweeplog_core::Locator;

use crate::error::BlobError;
use crate::store::AttachmentStore;

/// Run the full attachment store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_attachment_store_conformance_tests(
    store: &dyn AttachmentStore,
) -> Result<(), BlobError> {
    test_round_trip(store).await?;
    test_binary_exactness(store).await?;
    test_distinct_locators(store).await?;
    test_empty_payload_rejected(store).await?;
    test_fetch_missing(store).await?;
    test_fetch_foreign(store).await?;
    Ok(())
}

async fn test_round_trip(store: &dyn AttachmentStore) -> Result<(), BlobError> {
    let data = Bytes::from_static(b"before-photo-bytes");
    let locator = store.store(data.clone(), "x").await?;
    let fetched = store.fetch(&locator).await?;
    assert_eq!(fetched, data, "fetch should return the stored bytes");
    Ok(())
}

async fn test_binary_exactness(store: &dyn AttachmentStore) -> Result<(), BlobError> {
    let data: Bytes = (0..=255u8).cycle().take(4096).collect::<Vec<u8>>().into();
    let locator = store.store(data.clone(), "binary.bin").await?;
    let fetched = store.fetch(&locator).await?;
    assert_eq!(fetched.len(), data.len(), "length should be preserved");
    assert_eq!(fetched, data, "every byte should be preserved");
    Ok(())
}

async fn test_distinct_locators(store: &dyn AttachmentStore) -> Result<(), BlobError> {
    let first = store.store(Bytes::from_static(b"one"), "same.png").await?;
    let second = store.store(Bytes::from_static(b"two"), "same.png").await?;
    assert_ne!(first, second, "identical hints must yield distinct locators");

    assert_eq!(store.fetch(&first).await?, Bytes::from_static(b"one"));
    assert_eq!(
        store.fetch(&second).await?,
        Bytes::from_static(b"two"),
        "second store must not overwrite the first"
    );
    Ok(())
}

async fn test_empty_payload_rejected(store: &dyn AttachmentStore) -> Result<(), BlobError> {
    let result = store.store(Bytes::new(), "empty.png").await;
    assert!(
        matches!(result, Err(BlobError::InvalidPayload(_))),
        "empty payload should fail with InvalidPayload, got {result:?}"
    );
    Ok(())
}

async fn test_fetch_missing(store: &dyn AttachmentStore) -> Result<(), BlobError> {
    let locator = store.store(Bytes::from_static(b"present"), "p").await?;
    let missing = Locator::new(format!("{locator}-missing"));
    let result = store.fetch(&missing).await;
    assert!(
        matches!(result, Err(BlobError::NotFound(_))),
        "fetch of an unknown key should fail with NotFound, got {result:?}"
    );

    // The key prefix names a directory on path-based backends, never a blob.
    if let Some((prefix, _)) = locator.as_str().rsplit_once('/') {
        let result = store.fetch(&Locator::new(prefix)).await;
        assert!(
            matches!(result, Err(BlobError::NotFound(_))),
            "fetch of a key prefix should fail with NotFound, got {result:?}"
        );
    }
    Ok(())
}

async fn test_fetch_foreign(store: &dyn AttachmentStore) -> Result<(), BlobError> {
    let result = store
        .fetch(&Locator::new("unknown-scheme://nowhere/blob"))
        .await;
    assert!(
        matches!(result, Err(BlobError::InvalidLocator(_))),
        "fetch of a foreign locator should fail with InvalidLocator, got {result:?}"
    );
    Ok(())
}
