use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Cache storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not create the cache directory: {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not read from the file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write to the file: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not delete the file: {}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not list the cache directory: {}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, StorageError>;
