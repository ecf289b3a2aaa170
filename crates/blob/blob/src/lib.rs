pub mod error;
pub mod key;
pub mod limits;
pub mod locator;
pub mod store;
pub mod testing;

pub use error::BlobError;
pub use key::{DEFAULT_KEY_PREFIX, KeyGenerator, guess_content_type, sanitize_name_hint};
pub use limits::{BlobLimits, DEFAULT_MAX_SIZE_BYTES};
pub use locator::{LocatorScheme, validate_key};
pub use store::AttachmentStore;
