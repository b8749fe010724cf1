//! Sidecar writer port.

use std::path::{Path, PathBuf};

use crate::sidecar::SidecarDocument;

/// Port for persisting sidecar documents next to their source photo.
pub trait SidecarWriter: Send + Sync {
    /// Writes `document` for the photo at `source` and returns the sidecar path.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar cannot be written.
    fn write(&self, source: &Path, document: &SidecarDocument) -> anyhow::Result<PathBuf>;
}
