pub mod in_memory_snapshot_storage;
pub mod json_file_storage;
pub mod sled_storage;
pub mod snapshot_storage;

pub use in_memory_snapshot_storage::InMemorySnapshotStorage;
pub use json_file_storage::JsonFileSnapshotStorage;
pub use sled_storage::SledSnapshotStorage;
pub use snapshot_storage::SnapshotStorage;
