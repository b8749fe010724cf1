//! Straightened JPEG export.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use photo_cull_core::geometry::straighten;
use photo_cull_core::sidecar::MIN_STRAIGHTEN_ANGLE;
use tracing::{debug, warn};

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 95;

/// Writes `<stem>.jpg` previews, straightened when the tilt is significant.
#[derive(Debug, Clone)]
pub struct JpegExporter {
    dir: PathBuf,
    quality: u8,
}

impl JpegExporter {
    /// Exporter writing into `dir` at [`DEFAULT_QUALITY`].
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quality: DEFAULT_QUALITY,
        }
    }

    /// Overrides the JPEG quality (1-100).
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Output path for the photo at `source`.
    #[must_use]
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let stem = source.file_stem().unwrap_or(source.as_os_str());
        self.dir.join(format!("{}.jpg", stem.to_string_lossy()))
    }

    /// Exports `image`, decoded from `source`, corrected for `tilt_angle` degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be created or encoded.
    pub fn export(&self, source: &Path, image: &DynamicImage, tilt_angle: f64) -> Result<PathBuf> {
        let rgb = if tilt_angle.is_finite() && tilt_angle.abs() > MIN_STRAIGHTEN_ANGLE {
            straighten(image, tilt_angle).unwrap_or_else(|| {
                warn!(
                    "{}: tilt {tilt_angle:.2} too large to straighten, exporting as is",
                    source.display()
                );
                image.to_rgb8()
            })
        } else {
            image.to_rgb8()
        };

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.output_path(source);
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;

        JpegEncoder::new_with_quality(BufWriter::new(file), self.quality)
            .encode_image(&rgb)
            .with_context(|| format!("Failed to encode {}", path.display()))?;

        debug!(tilt_angle, "Exported {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_output_path() {
        let exporter = JpegExporter::new("/out");
        assert_eq!(
            exporter.output_path(Path::new("/shoot/DSC0001.NEF")),
            PathBuf::from("/out/DSC0001.jpg")
        );
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(JpegExporter::new("/out").with_quality(0).quality, 1);
        assert_eq!(JpegExporter::new("/out").with_quality(200).quality, 100);
    }

    #[test]
    fn test_export_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let exporter = JpegExporter::new(dir.path());
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([180, 120, 60])));

        for (name, tilt) in [("level.png", 0.0), ("tilted.png", 3.5)] {
            let path = exporter
                .export(Path::new(name), &image, tilt)
                .unwrap_or_else(|e| panic!("{e}"));
            let back = image::open(&path).unwrap_or_else(|e| panic!("{e}"));
            assert_eq!((back.width(), back.height()), (64, 48));
        }
    }
}
