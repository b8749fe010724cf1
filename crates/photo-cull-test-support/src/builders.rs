//! Synthetic photo builders for testing.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use photo_cull_core::domain::{ImageInfo, Region};

/// Builder for synthetic photos with known sharpness, exposure and tilt.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Sharpness ===

    /// High-contrast checkerboard with 8 px cells. Scores well above the
    /// default sharpness threshold.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> ImageInfo {
        Self::checkerboard_with_cell_size(width, height, 8)
    }

    /// Checkerboard with a custom cell size, alternating 30 and 220.
    #[must_use]
    pub fn checkerboard_with_cell_size(width: u32, height: u32, cell_size: u32) -> ImageInfo {
        let cell = cell_size.max(1);
        let img = RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([220, 220, 220])
            } else {
                Rgb([30, 30, 30])
            }
        });
        ImageInfo::new("synthetic://checkerboard", DynamicImage::ImageRgb8(img))
    }

    /// Uniform gray frame: no gradients at all.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> ImageInfo {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        ImageInfo::new("synthetic://uniform_gray", DynamicImage::ImageLuma8(img))
    }

    /// Smooth horizontal ramp from 0 to 255 with no edges.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn soft_ramp(width: u32, height: u32) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, _| {
            Luma([((u32::from(u8::MAX) * x) / width.max(1)) as u8])
        });
        ImageInfo::new("synthetic://soft_ramp", DynamicImage::ImageLuma8(img))
    }

    /// Flat mid-gray frame with a textured square covering `subject`.
    ///
    /// Pairs with a detector returning `subject` to test region scoring.
    #[must_use]
    pub fn sharp_subject(width: u32, height: u32, subject: Region) -> ImageInfo {
        let inside = |x: u32, y: u32| {
            x >= subject.x
                && y >= subject.y
                && x < subject.x.saturating_add(subject.width)
                && y < subject.y.saturating_add(subject.height)
        };
        let img = RgbImage::from_fn(width, height, |x, y| {
            if !inside(x, y) {
                Rgb([128, 128, 128])
            } else if (x / 3 + y / 3) % 2 == 0 {
                Rgb([240, 240, 240])
            } else {
                Rgb([20, 20, 20])
            }
        });
        ImageInfo::new("synthetic://sharp_subject", DynamicImage::ImageRgb8(img))
    }

    // === Exposure ===

    /// Textured frame with every sample at or below `max_brightness`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn dark_image(width: u32, height: u32, max_brightness: u8) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, y| {
            Luma([((x + y) % (u32::from(max_brightness) + 1)) as u8])
        });
        ImageInfo::new("synthetic://dark", DynamicImage::ImageLuma8(img))
    }

    /// Textured frame with every sample at or above `min_brightness`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bright_image(width: u32, height: u32, min_brightness: u8) -> ImageInfo {
        let range = u32::from(u8::MAX - min_brightness) + 1;
        let img = GrayImage::from_fn(width, height, |x, y| {
            Luma([min_brightness + ((x + y) % range) as u8])
        });
        ImageInfo::new("synthetic://bright", DynamicImage::ImageLuma8(img))
    }

    /// Uniform color frame.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> ImageInfo {
        let img = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
        ImageInfo::new("synthetic://rgb_uniform", DynamicImage::ImageRgb8(img))
    }

    // === Tilt ===

    /// Dark sky over bright ground, split by a straight horizon through the
    /// frame centre at `angle_deg` from level (positive descends to the right).
    #[must_use]
    pub fn horizon(width: u32, height: u32, angle_deg: f64) -> ImageInfo {
        let slope = angle_deg.to_radians().tan();
        let cx = f64::from(width) / 2.0;
        let cy = f64::from(height) / 2.0;
        let img = GrayImage::from_fn(width, height, |x, y| {
            let boundary = slope.mul_add(f64::from(x) - cx, cy);
            if f64::from(y) < boundary {
                Luma([25])
            } else {
                Luma([225])
            }
        });
        ImageInfo::new("synthetic://horizon", DynamicImage::ImageLuma8(img))
    }

    // === Edge cases ===

    /// A 1x1 frame.
    #[must_use]
    pub fn single_pixel(value: u8) -> ImageInfo {
        Self::uniform_gray(1, 1, value)
    }

    /// Standard sharp landscape test photo (160x120 checkerboard).
    #[must_use]
    pub fn sharp_photo() -> ImageInfo {
        Self::checkerboard(160, 120)
    }

    /// Standard soft landscape test photo (160x120 uniform gray).
    #[must_use]
    pub fn blurry_photo() -> ImageInfo {
        Self::uniform_gray(160, 120, 128)
    }
}

/// Saves `image` as PNG under `dir` and returns the written path.
///
/// # Errors
///
/// Returns an error if the file cannot be encoded or written.
pub fn write_png(dir: &Path, name: &str, image: &ImageInfo) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    image.image.save_with_format(&path, image::ImageFormat::Png)?;
    Ok(path)
}
