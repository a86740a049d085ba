//! Filesystem media store rooted at the configured media directory.
//!
//! All access goes through a `cap_std` directory handle, so stored paths can
//! never reach outside the media root. Blocking filesystem calls run on the
//! blocking pool.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{ImageStore, ImageStoreError};

/// [`ImageStore`] writing files beneath a media root.
#[derive(Clone)]
pub struct FsImageStore {
    root: Arc<Dir>,
    root_path: PathBuf,
}

impl FsImageStore {
    /// Open (creating if needed) the media root.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ImageStoreError> {
        let root = root.as_ref();
        let display = root.display().to_string();
        Dir::create_ambient_dir_all(root, ambient_authority())
            .map_err(|err| ImageStoreError::io(display.clone(), err.to_string()))?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|err| ImageStoreError::io(display, err.to_string()))?;
        Ok(Self {
            root: Arc::new(dir),
            root_path: root.to_path_buf(),
        })
    }

    /// Filesystem location of the media root.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    async fn run_blocking<T, F>(&self, path: &str, op: F) -> Result<T, ImageStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &Path) -> std::io::Result<T> + Send + 'static,
    {
        let relative = relative_path(path)?;
        let root = Arc::clone(&self.root);
        let owned = path.to_owned();
        tokio::task::spawn_blocking(move || op(&root, &relative))
            .await
            .map_err(|err| ImageStoreError::io(owned.clone(), err.to_string()))?
            .map_err(|err| ImageStoreError::io(owned, err.to_string()))
    }
}

/// Validate a media-root-relative path made of plain components.
pub(crate) fn relative_path(path: &str) -> Result<PathBuf, ImageStoreError> {
    let candidate = Path::new(path);
    let plain = !path.is_empty()
        && candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if plain {
        Ok(candidate.to_path_buf())
    } else {
        Err(ImageStoreError::invalid_path(path))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), ImageStoreError> {
        let contents = bytes.to_vec();
        self.run_blocking(path, move |root, relative| {
            if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
                root.create_dir_all(parent)?;
            }
            root.write(relative, contents)
        })
        .await?;
        debug!(%path, size = bytes.len(), "stored media file");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
        self.run_blocking(path, |root, relative| match root.remove_file(relative) {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await?;
        debug!(%path, "removed media file");
        Ok(())
    }
}
