//! Filesystem adapter for discovering photos.

use anyhow::Result;
use photo_cull_core::ports::PhotoSource;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Camera raw extensions, decoded through rawloader.
pub const RAW_EXTENSIONS: &[&str] = &["cr2", "cr3", "nef", "arw", "raf", "dng", "orf", "rw2"];
/// Raster extensions, decoded through the image crate.
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp"];

/// Filesystem photo source adapter.
///
/// Explicit files are yielded in argument order; directory contents are
/// sorted by path so runs are reproducible.
pub struct FsPhotoSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsPhotoSource {
    /// Creates a new filesystem photo source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all photo files from the configured paths.
    #[must_use]
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_photo(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && is_supported_photo(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl PhotoSource for FsPhotoSource {
    fn photos(&self) -> Box<dyn Iterator<Item = Result<PathBuf>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} photo files", files.len());

        Box::new(files.into_iter().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Checks if a path has a supported raw or raster extension.
#[must_use]
pub fn is_supported_photo(path: &Path) -> bool {
    extension(path).is_some_and(|e| {
        RASTER_EXTENSIONS.contains(&e.as_str()) || RAW_EXTENSIONS.contains(&e.as_str())
    })
}

/// Checks if a path has a camera raw extension.
#[must_use]
pub fn is_raw(path: &Path) -> bool {
    extension(path).is_some_and(|e| RAW_EXTENSIONS.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_photo() {
        assert!(is_supported_photo(Path::new("test.jpg")));
        assert!(is_supported_photo(Path::new("test.JPEG")));
        assert!(is_supported_photo(Path::new("test.tif")));
        assert!(is_supported_photo(Path::new("test.cr3")));
        assert!(is_supported_photo(Path::new("test.RW2")));
        assert!(!is_supported_photo(Path::new("test.gif")));
        assert!(!is_supported_photo(Path::new("test.xmp")));
        assert!(!is_supported_photo(Path::new("test")));
    }

    #[test]
    fn test_is_raw() {
        assert!(is_raw(Path::new("a.ARW")));
        assert!(is_raw(Path::new("a.dng")));
        assert!(!is_raw(Path::new("a.png")));
    }
}
