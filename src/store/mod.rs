//! Persistent key/value storage for cached catalogs
//!
//! The cache gate only needs string `get`/`set` by key. [`FileStore`] keeps
//! one file per key in the XDG cache directory; [`MemoryStore`] keeps entries
//! in memory for tests and embedding.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur when writing to a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters the backend cannot store verbatim
    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),
}

/// A string key/value store
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
