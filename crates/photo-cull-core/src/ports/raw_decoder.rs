//! Decoder port turning a file into a full-resolution color raster.

use std::path::Path;

use crate::domain::ImageInfo;

/// Port for decoding raw and raster files.
pub trait RawDecoder: Send + Sync {
    /// Decodes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    fn decode(&self, path: &Path) -> anyhow::Result<ImageInfo>;
}
