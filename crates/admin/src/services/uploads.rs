//! Media upload storage.
//!
//! Uploads are validated by extension allowlist and stored under a
//! randomized name so a crafted original file name never reaches the
//! filesystem. The database only carries the resulting metadata row; this
//! service owns the bytes.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

/// Extensions accepted for product photos.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Length of the random portion of a stored file name.
const STORED_NAME_LEN: usize = 8;

/// Errors from media storage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The original file name has no usable extension.
    #[error("file name has no extension: {0}")]
    MissingExtension(String),

    /// The extension is not in the allowlist.
    #[error("unsupported file type: .{0}")]
    UnsupportedType(String),

    /// Writing or removing the file failed.
    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem storage for uploaded product photos.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    dir: PathBuf,
}

impl MediaStorage {
    /// Storage rooted at the configured upload directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory uploads are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pick the stored name for an upload: random stem plus the original
    /// extension, lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::MissingExtension`] when the original name has
    /// no extension, or [`UploadError::UnsupportedType`] when it is not an
    /// accepted image type.
    pub fn stored_name(original: &str) -> Result<String, UploadError> {
        let ext = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| UploadError::MissingExtension(original.to_owned()))?;

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(UploadError::UnsupportedType(ext));
        }

        let stem: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(STORED_NAME_LEN)
            .map(char::from)
            .collect();
        Ok(format!("{}.{ext}", stem.to_lowercase()))
    }

    /// Write an upload's bytes under its stored name.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Io`] if the directory cannot be created or
    /// the file cannot be written.
    pub async fn save(&self, stored_name: &str, bytes: &[u8]) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(stored_name), bytes).await?;
        Ok(())
    }

    /// Remove a stored file. Missing files are fine - the metadata row is
    /// the source of truth and the bytes may already be gone.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Io`] for failures other than the file being
    /// absent.
    pub async fn remove(&self, stored_name: &str) -> Result<(), UploadError> {
        match tokio::fs::remove_file(self.dir.join(stored_name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = MediaStorage::stored_name("Photo.JPG").expect("accepted");
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), STORED_NAME_LEN + ".jpg".len());
    }

    #[test]
    fn test_stored_name_randomizes_stem() {
        let a = MediaStorage::stored_name("x.png").expect("accepted");
        let b = MediaStorage::stored_name("x.png").expect("accepted");
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_unsupported_type() {
        assert!(matches!(
            MediaStorage::stored_name("script.php"),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            MediaStorage::stored_name("no-extension"),
            Err(UploadError::MissingExtension(_))
        ));
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = std::env::temp_dir().join(format!(
            "storeroom-test-{}",
            MediaStorage::stored_name("probe.png").expect("name")
        ));
        let storage = MediaStorage::new(&dir);

        storage.save("photo.png", b"bytes").await.expect("save");
        assert!(dir.join("photo.png").exists());

        storage.remove("photo.png").await.expect("remove");
        assert!(!dir.join("photo.png").exists());
        // Removing again is not an error.
        storage.remove("photo.png").await.expect("remove again");

        tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
    }
}
