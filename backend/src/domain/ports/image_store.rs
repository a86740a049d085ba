//! Port for media file storage.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image store adapters.
    pub enum ImageStoreError {
        /// Reading or writing the backing storage failed.
        Io { path: String, message: String } =>
            "image store failed for {path}: {message}",
        /// The path escapes the media root or is otherwise unusable.
        InvalidPath { path: String } =>
            "invalid media path: {path}",
    }
}

/// Port for storing image bytes under media-root-relative paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write `bytes` at `path`, creating parent directories.
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), ImageStoreError>;

    /// Remove the file at `path`. Missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), ImageStoreError>;
}
