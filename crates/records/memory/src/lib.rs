pub mod store;

pub use store::{Clock, MemoryRecordStore};
