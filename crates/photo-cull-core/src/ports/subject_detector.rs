//! Subject detector port.

use crate::domain::{ImageInfo, Region};

/// Port for locating subjects (faces) in a raster.
///
/// Implementations are shared across worker threads and must be read-only
/// after construction.
pub trait SubjectDetector: Send + Sync {
    /// Returns regions likely containing a face, in raster pixel coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn detect(&self, image: &ImageInfo) -> anyhow::Result<Vec<Region>>;
}
