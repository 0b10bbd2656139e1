mod coordinator;
mod store;

pub use coordinator::Coordinator;
pub use store::{CacheRecord, CacheStore};
