pub mod store;

pub use store::{DEFAULT_MEMORY_BASE, MemoryAttachmentStore};
