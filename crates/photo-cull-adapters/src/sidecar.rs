//! Filesystem sidecar writer.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use photo_cull_core::ports::SidecarWriter;
use photo_cull_core::sidecar::SidecarDocument;
use tracing::debug;

/// Writes `<stem>.xmp` beside the photo, or into a fixed directory.
#[derive(Debug, Clone, Default)]
pub struct FsSidecarWriter {
    dir: Option<PathBuf>,
}

impl FsSidecarWriter {
    /// Writer placing sidecars next to their photos.
    #[must_use]
    pub const fn beside_photos() -> Self {
        Self { dir: None }
    }

    /// Writer placing every sidecar in `dir`, created on first write.
    #[must_use]
    pub fn into_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Sidecar path for the photo at `source`.
    #[must_use]
    pub fn sidecar_path(&self, source: &Path) -> PathBuf {
        let name = source.with_extension("xmp");
        match (&self.dir, name.file_name()) {
            (Some(dir), Some(file_name)) => dir.join(file_name),
            _ => name,
        }
    }
}

impl SidecarWriter for FsSidecarWriter {
    fn write(&self, source: &Path, document: &SidecarDocument) -> Result<PathBuf> {
        let path = self.sidecar_path(source);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, &document.content)
            .with_context(|| format!("Failed to write sidecar {}", path.display()))?;
        debug!(strategy = ?document.strategy, "Wrote {}", path.display());
        Ok(path)
    }
}
