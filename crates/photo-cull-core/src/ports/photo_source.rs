//! Photo source port for discovering files to analyze.

use std::path::PathBuf;

/// Port for enumerating candidate photos.
pub trait PhotoSource: Send + Sync {
    /// Returns an iterator over discovered photo paths.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a directory cannot be read.
    fn photos(&self) -> Box<dyn Iterator<Item = anyhow::Result<PathBuf>> + Send + '_>;

    /// Returns the total number of photos, if known.
    fn count_hint(&self) -> Option<usize>;
}
