//! S3-compatible [`AttachmentStore`](sweeplog_blob::AttachmentStore) backend.

pub mod config;
pub mod store;

pub use config::S3AttachmentConfig;
pub use store::S3AttachmentStore;
