//! Exposure gate.
//!
//! Measures mean perceptual brightness and classifies it against the
//! configured brightness window.

use image::GrayImage;
use tracing::warn;

use crate::domain::{perceptual_luma, ImageInfo, SelectionThresholds, NEUTRAL_BRIGHTNESS};

/// 256-bin histogram of 8-bit sample values.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Compute histogram from grayscale image.
    #[must_use]
    pub fn from_luma(image: &GrayImage) -> Self {
        let mut bins = [0u64; 256];
        for pixel in image.pixels() {
            bins[usize::from(pixel.0[0])] += 1;
        }
        let total = bins.iter().sum();
        Self { bins, total }
    }

    /// Returns the total pixel count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Mean sample value, or `None` for an empty histogram.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let sum: u64 = self
            .bins
            .iter()
            .zip(0u64..)
            .map(|(&count, value)| value * count)
            .sum();
        Some(sum as f64 / self.total as f64)
    }
}

/// Over/under-exposure flags for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExposureClass {
    /// Brightness below the minimum.
    pub is_too_dark: bool,
    /// Brightness above the maximum.
    pub is_burned_out: bool,
}

/// Brightness measurement and classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureGate;

#[allow(clippy::unused_self)]
impl ExposureGate {
    /// Mean brightness on the 0-255 scale.
    ///
    /// Color rasters use perceptual luminance, single-channel rasters their
    /// 8-bit sample mean. An empty raster reports the neutral value 128.
    #[must_use]
    pub fn brightness(&self, image: &ImageInfo) -> f64 {
        let mean = if image.is_color() {
            mean_perceptual_luma(image)
        } else {
            Histogram::from_luma(&image.image.to_luma8()).mean()
        };

        mean.unwrap_or_else(|| {
            warn!(path = %image.path, "Cannot measure brightness of an empty raster");
            NEUTRAL_BRIGHTNESS
        })
    }

    /// Classifies a brightness against the thresholds' window.
    #[must_use]
    pub fn classify(&self, brightness: f64, thresholds: &SelectionThresholds) -> ExposureClass {
        ExposureClass {
            is_too_dark: brightness < thresholds.brightness_min,
            is_burned_out: brightness > thresholds.brightness_max,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_perceptual_luma(image: &ImageInfo) -> Option<f64> {
    let rgb = image.image.to_rgb8();
    let count = u64::from(rgb.width()) * u64::from(rgb.height());
    if count == 0 {
        return None;
    }
    let sum: f64 = rgb
        .pixels()
        .map(|p| perceptual_luma(p.0[0], p.0[1], p.0[2]))
        .sum();
    Some(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Luma, Rgb, RgbImage};

    fn rgb_info(width: u32, height: u32, pixel: [u8; 3]) -> ImageInfo {
        ImageInfo::new(
            "test.png",
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(pixel))),
        )
    }

    #[test]
    fn test_histogram_mean_uniform() {
        let img = GrayImage::from_pixel(100, 100, Luma([128]));
        let hist = Histogram::from_luma(&img);
        assert_eq!(hist.total(), 10_000);
        let mean = hist.mean().unwrap_or_default();
        assert!((mean - 128.0).abs() < 0.001, "mean should be 128, got {mean}");
    }

    #[test]
    fn test_histogram_empty() {
        let hist = Histogram::from_luma(&GrayImage::new(0, 0));
        assert_eq!(hist.mean(), None);
    }

    #[test]
    fn test_gray_brightness_is_sample_mean() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { Luma([10]) } else { Luma([30]) });
        let info = ImageInfo::new("g.png", DynamicImage::ImageLuma8(img));
        assert!((ExposureGate.brightness(&info) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_brightness_is_perceptual() {
        let info = rgb_info(4, 4, [0, 255, 0]);
        assert!((ExposureGate.brightness(&info) - 149.685).abs() < 1e-9);
    }

    #[test]
    fn test_empty_raster_is_neutral() {
        let info = rgb_info(0, 0, [0, 0, 0]);
        assert!((ExposureGate.brightness(&info) - 128.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_window() {
        let t = SelectionThresholds::default();
        assert_eq!(
            ExposureGate.classify(29.9, &t),
            ExposureClass {
                is_too_dark: true,
                is_burned_out: false
            }
        );
        assert_eq!(ExposureGate.classify(30.0, &t), ExposureClass::default());
        assert_eq!(ExposureGate.classify(220.0, &t), ExposureClass::default());
        assert_eq!(
            ExposureGate.classify(220.1, &t),
            ExposureClass {
                is_too_dark: false,
                is_burned_out: true
            }
        );
    }
}
