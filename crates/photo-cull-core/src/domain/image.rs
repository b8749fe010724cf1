//! Decoded raster handed to the analysis components.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};

/// Basic image information produced by a decoder.
///
/// Created per analysis call and dropped once the photo has been scored.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path to the source file.
    pub path: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Decoded image data.
    pub image: DynamicImage,
}

impl ImageInfo {
    /// Wraps a decoded image, taking the dimensions from the pixel data.
    #[must_use]
    pub fn new(path: impl Into<String>, image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            path: path.into(),
            width,
            height,
            image,
        }
    }

    /// Whether the frame is landscape. Square frames count as vertical.
    #[must_use]
    pub const fn is_horizontal(&self) -> bool {
        self.width > self.height
    }

    /// Returns true if the raster carries color channels.
    #[must_use]
    pub fn is_color(&self) -> bool {
        self.image.color().has_color()
    }

    /// 8-bit perceptual luminance projection (`0.299 R + 0.587 G + 0.114 B`).
    ///
    /// Single-channel rasters are returned as their 8-bit samples.
    #[must_use]
    pub fn to_luma8(&self) -> GrayImage {
        if !self.is_color() {
            return self.image.to_luma8();
        }

        let rgb = self.image.to_rgb8();
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Luma([perceptual_luma_u8(r, g, b)])
        })
    }
}

/// Perceptual luminance of an 8-bit RGB sample.
#[inline]
#[must_use]
pub fn perceptual_luma(r: u8, g: u8, b: u8) -> f64 {
    0.114f64.mul_add(
        f64::from(b),
        0.299f64.mul_add(f64::from(r), 0.587 * f64::from(g)),
    )
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn perceptual_luma_u8(r: u8, g: u8, b: u8) -> u8 {
    // Weights sum to 1.0, so the rounded value stays within 0..=255.
    perceptual_luma(r, g, b).round().clamp(0.0, 255.0) as u8
}
