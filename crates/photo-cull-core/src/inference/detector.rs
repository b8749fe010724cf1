//! Face detector backed by `BlazeFace`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::blazeface::{BlazeFace, BlazeFaceConfig};
use super::runtime::{load_weights, select_device};
use crate::domain::{ImageInfo, Region};
use crate::ports::SubjectDetector;

/// [`SubjectDetector`] running `BlazeFace` on the best available device.
///
/// The model is loaded once at construction and shared read-only.
pub struct BlazeFaceDetector {
    model: BlazeFace,
}

impl BlazeFaceDetector {
    /// Loads weights from `weights` and builds the detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights cannot be read or do not match the
    /// network.
    pub fn load(weights: &Path, config: BlazeFaceConfig) -> Result<Self> {
        let device = select_device();
        let vb = load_weights(weights, &device).context("Failed to load BlazeFace weights")?;
        let model = BlazeFace::new(vb, config).context("Failed to create BlazeFace model")?;
        Ok(Self { model })
    }
}

impl SubjectDetector for BlazeFaceDetector {
    fn detect(&self, image: &ImageInfo) -> Result<Vec<Region>> {
        let faces = self
            .model
            .detect(&image.image)
            .with_context(|| format!("Face detection failed for {}", image.path))?;

        let regions: Vec<Region> = faces
            .iter()
            .filter_map(|face| face.to_region(image.width, image.height))
            .collect();

        debug!(path = %image.path, faces = regions.len(), "Faces detected");
        Ok(regions)
    }
}
