//! Content-addressed key-value cache for fetched pages and generated lists.

mod atomic;
pub mod error;
pub mod file;

pub use error::{Result, StorageError};
pub use file::{FileCache, hash_key};

/// Opaque string-to-string store shared by the fetcher and the generator.
///
/// Concurrent writes to distinct keys must be safe. Writes to the same key
/// race and the last one wins.
pub trait KeyValueCache: Send + Sync {
    /// Returns `None` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;
    /// Inserts or replaces the value.
    fn write(&self, key: &str, value: &str) -> Result<()>;
    /// Removes every entry. A failure may leave a partially cleared store.
    fn clear(&self) -> Result<()>;
}
