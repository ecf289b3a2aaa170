use bytes::Bytes;
use sweeplog_core::Side;

/// A photo waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Raw file contents.
    pub data: Bytes,
    /// Original file name; only used to disambiguate the storage key.
    pub name_hint: String,
}

impl ImageUpload {
    /// Wrap file contents and their original name.
    pub fn new(data: impl Into<Bytes>, name_hint: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            name_hint: name_hint.into(),
        }
    }
}

/// Everything the user entered for one report.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Note describing the state before cleaning.
    pub before_note: String,
    /// Note describing the state after cleaning.
    pub after_note: String,
    /// Photo of the state before cleaning.
    pub before_image: Option<ImageUpload>,
    /// Photo of the state after cleaning.
    pub after_image: Option<ImageUpload>,
}

impl Submission {
    /// Create an empty submission (no notes, no photos).
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

    /// Set the image for one side, replacing any previous one.
    #[must_use]
    pub fn with_image(mut self, side: Side, image: ImageUpload) -> Self {
        match side {
            Side::Before => self.before_image = Some(image),
            Side::After => self.after_image = Some(image),
        }
        self
    }
}
