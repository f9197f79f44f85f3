//! Uploaded media domain type.
//!
//! Only the metadata row lives in the database; the bytes sit under the
//! configured upload directory with the stored file name.

use storeroom_core::MediaId;

/// An uploaded product photo.
#[derive(Debug, Clone)]
pub struct Media {
    pub id: MediaId,
    /// Stored (randomized) file name under the upload directory.
    pub file_name: String,
}
