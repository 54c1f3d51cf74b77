use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::KeyValueCache;
use crate::atomic::write_bytes_atomic;
use crate::error::{Result, StorageError};

/// One file per key under `base_path`, named by the hex digest of the key.
#[derive(Debug, Clone)]
pub struct FileCache {
    base_path: PathBuf,
}

impl FileCache {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Creates the backing directory when it is missing.
    pub fn setup(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).map_err(|source| StorageError::CreateDir {
            path: self.base_path.clone(),
            source,
        })
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(hash_key(key))
    }
}

impl KeyValueCache for FileCache {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        write_bytes_atomic(&path, value.as_bytes())
            .map_err(|source| StorageError::Write { path, source })?;
        debug!(key, bytes = value.len(), "cache entry written");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.base_path).map_err(|source| StorageError::List {
            path: self.base_path.clone(),
            source,
        })?;
        let mut removed = 0_usize;
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::List {
                path: self.base_path.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            fs::remove_file(&path).map_err(|source| StorageError::Remove { path, source })?;
            removed += 1;
        }
        info!(path = %self.base_path.display(), removed, "cache cleared");
        Ok(())
    }
}

/// Fixed-length, file-safe name for a cache key.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}
