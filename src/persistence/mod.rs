//! Durable local storage for snapshots and credentials.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use traits::{SnapshotStore, StorageError};
