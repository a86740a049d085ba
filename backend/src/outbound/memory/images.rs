//! Image store keeping file bytes in a map.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{ImageStore, ImageStoreError};
use crate::outbound::media::relative_path;

/// [`ImageStore`] that never touches the filesystem.
#[derive(Default)]
pub struct MemoryImageStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file is stored at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    /// Paths of every stored file, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned(path: &str) -> ImageStoreError {
    ImageStoreError::io(path, "memory image store lock poisoned")
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), ImageStoreError> {
        relative_path(path)?;
        let mut files = self.files.lock().map_err(|_| poisoned(path))?;
        files.insert(path.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
        relative_path(path)?;
        let mut files = self.files.lock().map_err(|_| poisoned(path))?;
        files.remove(path);
        Ok(())
    }
}
