//! Storage collaborators for epgedit.
//!
//! Both implement [`epgedit_core::ScheduleStore`]; the gateway and CLI pick
//! one from `[storage] backend`.

pub mod file_store;
pub mod in_memory;

pub use file_store::FileStore;
pub use in_memory::MemoryStore;

use std::sync::Arc;

use epgedit_config::StorageConfig;
use epgedit_core::ScheduleStore;

/// Build the store named by the configuration.
pub fn from_config(storage: &StorageConfig) -> Arc<dyn ScheduleStore> {
    match storage.backend.as_str() {
        "memory" => Arc::new(MemoryStore::new()),
        _ => Arc::new(FileStore::from_config(storage)),
    }
}
