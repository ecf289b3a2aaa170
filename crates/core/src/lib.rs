pub mod record;
pub mod types;

pub use record::{AttachmentRef, NewRecord, Record, Side};
pub use types::{Locator, RecordId};
