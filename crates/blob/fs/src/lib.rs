pub mod config;
pub mod store;

pub use config::FsAttachmentConfig;
pub use store::FsAttachmentStore;
