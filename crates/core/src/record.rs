use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Locator, RecordId};

/// Which half of a cleaning report an attachment or note belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Side {
    /// The state before cleaning.
    Before,
    /// The state after cleaning.
    After,
}

impl Side {
    /// Return the lowercase name used in logs and storage keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a blob held by an attachment store.
///
/// The record store only keeps the locator; it never owns the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachmentRef {
    /// Locator returned by the attachment store.
    pub locator: Locator,
}

impl AttachmentRef {
    /// Wrap a locator.
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
        }
    }
}

impl From<Locator> for AttachmentRef {
    fn from(locator: Locator) -> Self {
        Self { locator }
    }
}

/// Caller-supplied fields of a record that has not been persisted yet.
///
/// Attachments must already be uploaded; only their locators are carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewRecord {
    /// Note describing the state before cleaning.
    #[serde(default)]
    pub before_note: String,
    /// Note describing the state after cleaning.
    #[serde(default)]
    pub after_note: String,
    /// Photo of the state before cleaning.
    #[serde(default)]
    pub before_attachment: Option<AttachmentRef>,
    /// Photo of the state after cleaning.
    #[serde(default)]
    pub after_attachment: Option<AttachmentRef>,
}

impl NewRecord {
    /// Create an empty record (no notes, no attachments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the before note.
    #[must_use]
    pub fn with_before_note(mut self, note: impl Into<String>) -> Self {
        self.before_note = note.into();
        self
    }

    /// Set the after note.
    #[must_use]
    pub fn with_after_note(mut self, note: impl Into<String>) -> Self {
        self.after_note = note.into();
        self
    }

    /// Attach a locator to the given side, replacing any previous one.
    #[must_use]
    pub fn with_attachment(mut self, side: Side, locator: impl Into<Locator>) -> Self {
        let attachment = Some(AttachmentRef::new(locator));
        match side {
            Side::Before => self.before_attachment = attachment,
            Side::After => self.after_attachment = attachment,
        }
        self
    }
}

/// A persisted cleaning report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Record {
    /// Unique identifier assigned by the store.
    pub id: RecordId,
    /// Note describing the state before cleaning (empty when not given).
    pub before_note: String,
    /// Note describing the state after cleaning (empty when not given).
    pub after_note: String,
    /// Photo of the state before cleaning.
    pub before_attachment: Option<AttachmentRef>,
    /// Photo of the state after cleaning.
    pub after_attachment: Option<AttachmentRef>,
    /// Store-assigned commit timestamp.
    pub created_at: DateTime<Utc>,
    /// Store-assigned insertion sequence; breaks `created_at` ties.
    pub sequence: u64,
}

impl Record {
    /// Build a persisted record from its caller-supplied fields and the
    /// values the store assigned at commit time.
    pub fn from_new(new: NewRecord, id: RecordId, created_at: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            id,
            before_note: new.before_note,
            after_note: new.after_note,
            before_attachment: new.before_attachment,
            after_attachment: new.after_attachment,
            created_at,
            sequence,
        }
    }

    /// Return the attachment on the given side, if any.
    pub fn attachment(&self, side: Side) -> Option<&AttachmentRef> {
        match side {
            Side::Before => self.before_attachment.as_ref(),
            Side::After => self.after_attachment.as_ref(),
        }
    }

    /// Listing order: newest `created_at` first, later insertion first on ties.
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.sequence.cmp(&a.sequence))
    }
}
