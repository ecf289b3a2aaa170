use sweeplog_core::{NewRecord, Record, RecordId, Side};

use crate::error::RecordError;
use crate::store::RecordStore;

/// Run the full record store conformance test suite.
///
/// Call this from your backend's test module. The store may already hold
/// records; every check only looks at the records it creates itself.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_record_store_conformance_tests(
    store: &dyn RecordStore,
) -> Result<(), RecordError> {
    test_create_returns_fields(store).await?;
    test_visible_after_create(store).await?;
    test_newest_first(store).await?;
    test_duplicates_are_distinct(store).await?;
    test_empty_record(store).await?;
    test_listing_is_deterministic(store).await?;
    Ok(())
}

fn marker() -> String {
    RecordId::generate().into_inner()
}

fn position(records: &[Record], id: &RecordId) -> Option<usize> {
    records.iter().position(|r| &r.id == id)
}

async fn test_create_returns_fields(store: &dyn RecordStore) -> Result<(), RecordError> {
    let note = marker();
    let new = NewRecord::new()
        .with_before_note(format!("dirty {note}"))
        .with_after_note("clean")
        .with_attachment(Side::Before, "memory://attachments/images/1-a.png")
        .with_attachment(Side::After, "memory://attachments/images/2-b.png");

    let record = store.create(new).await?;
    assert!(!record.id.is_empty(), "id must be assigned");
    assert_eq!(record.before_note, format!("dirty {note}"));
    assert_eq!(record.after_note, "clean");
    assert_eq!(
        record.attachment(Side::Before).map(|a| a.locator.as_str()),
        Some("memory://attachments/images/1-a.png")
    );
    assert_eq!(
        record.attachment(Side::After).map(|a| a.locator.as_str()),
        Some("memory://attachments/images/2-b.png")
    );
    Ok(())
}

async fn test_visible_after_create(store: &dyn RecordStore) -> Result<(), RecordError> {
    let record = store
        .create(NewRecord::new().with_before_note(marker()))
        .await?;
    let listed = store.list_all().await?;
    let found = listed
        .iter()
        .find(|r| r.id == record.id)
        .expect("created record should be listed");
    assert_eq!(found, &record, "listed record should equal the created one");
    Ok(())
}

async fn test_newest_first(store: &dyn RecordStore) -> Result<(), RecordError> {
    let first = store.create(NewRecord::new().with_before_note("A")).await?;
    let second = store.create(NewRecord::new().with_before_note("B")).await?;
    assert!(
        second.created_at >= first.created_at,
        "created_at must not go backwards"
    );
    assert!(second.sequence > first.sequence, "sequence must increase");

    let listed = store.list_all().await?;
    let a = position(&listed, &first.id).expect("first record listed");
    let b = position(&listed, &second.id).expect("second record listed");
    assert!(b < a, "later record should be listed first");

    for pair in listed.windows(2) {
        assert_ne!(
            Record::newest_first(&pair[0], &pair[1]),
            std::cmp::Ordering::Greater,
            "listing must be ordered newest first"
        );
    }
    Ok(())
}

async fn test_duplicates_are_distinct(store: &dyn RecordStore) -> Result<(), RecordError> {
    let new = NewRecord::new()
        .with_before_note(marker())
        .with_after_note("same");
    let one = store.create(new.clone()).await?;
    let two = store.create(new).await?;
    assert_ne!(one.id, two.id, "duplicate creates must get distinct ids");

    let listed = store.list_all().await?;
    assert!(position(&listed, &one.id).is_some());
    assert!(position(&listed, &two.id).is_some());
    Ok(())
}

async fn test_empty_record(store: &dyn RecordStore) -> Result<(), RecordError> {
    let record = store.create(NewRecord::new()).await?;
    assert_eq!(record.before_note, "");
    assert_eq!(record.after_note, "");
    assert!(record.before_attachment.is_none());
    assert!(record.after_attachment.is_none());

    let listed = store.list_all().await?;
    assert!(position(&listed, &record.id).is_some());
    Ok(())
}

async fn test_listing_is_deterministic(store: &dyn RecordStore) -> Result<(), RecordError> {
    store.create(NewRecord::new().with_before_note(marker())).await?;
    let first = store.list_all().await?;
    let second = store.list_all().await?;
    assert_eq!(first, second, "repeated listing must be identical");
    Ok(())
}
