//! Sharpness scoring.
//!
//! Scores focus as the mean Sobel gradient magnitude over the luminance
//! projection. When subject regions are known, only the central part of
//! each region is scored, since that is where a portrait is focused.

use image::{imageops, GrayImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::{debug, warn};

use crate::domain::{ImageInfo, Region};

/// Configuration for sharpness scoring.
#[derive(Debug, Clone, Copy)]
pub struct SharpnessConfig {
    /// Fraction of each region side kept when scoring subjects.
    pub center_factor: f64,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self { center_factor: 0.6 }
    }
}

/// Gradient-energy sharpness scorer.
#[derive(Debug, Clone, Default)]
pub struct SharpnessScorer {
    config: SharpnessConfig,
}

impl SharpnessScorer {
    /// Creates a new scorer with the given configuration.
    #[must_use]
    pub const fn new(config: SharpnessConfig) -> Self {
        Self { config }
    }

    /// Scores a raster, restricted to `regions` when any are given.
    #[must_use]
    pub fn score(&self, image: &ImageInfo, regions: &[Region]) -> f64 {
        self.score_luma(&image.to_luma8(), regions)
    }

    /// Scores an already projected luminance raster.
    ///
    /// Returns the mean score across usable regions, the whole-frame score
    /// when `regions` is empty, and 0 when nothing could be scored.
    #[must_use]
    pub fn score_luma(&self, luma: &GrayImage, regions: &[Region]) -> f64 {
        let score = if regions.is_empty() {
            gradient_energy(luma).unwrap_or(0.0)
        } else {
            self.score_regions(luma, regions)
        };

        if score.is_finite() && score >= 0.0 {
            score
        } else {
            warn!("Sharpness score {score} is not usable, reporting 0");
            0.0
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn score_regions(&self, luma: &GrayImage, regions: &[Region]) -> f64 {
        let scores: Vec<f64> = regions
            .iter()
            .filter_map(|region| {
                let Some(core) =
                    region.center_crop(self.config.center_factor, luma.width(), luma.height())
                else {
                    debug!(?region, "Region has no overlap with the raster, skipping");
                    return None;
                };
                let crop =
                    imageops::crop_imm(luma, core.x, core.y, core.width, core.height).to_image();
                gradient_energy(&crop)
            })
            .collect();

        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Mean of `sqrt(Gx² + Gy²)` over interior pixels, using 3x3 Sobel kernels.
///
/// Returns `None` when the raster has no interior pixel (either side below 3).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gradient_energy(luma: &GrayImage) -> Option<f64> {
    let (width, height) = luma.dimensions();
    if width < 3 || height < 3 {
        return None;
    }

    let gx = horizontal_sobel(luma);
    let gy = vertical_sobel(luma);

    let mut sum = 0.0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let dx = f64::from(gx.get_pixel(x, y).0[0]);
            let dy = f64::from(gy.get_pixel(x, y).0[0]);
            sum += dx.hypot(dy);
        }
    }

    let count = u64::from(width - 2) * u64::from(height - 2);
    Some(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(width: u32, height: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_default_config() {
        let config = SharpnessConfig::default();
        assert!((config.center_factor - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_uniform_is_zero() {
        let luma = GrayImage::from_pixel(50, 40, Luma([128]));
        let scorer = SharpnessScorer::default();
        assert!(scorer.score_luma(&luma, &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vertical_step_edge() {
        // Step from 0 to 100 between columns 4 and 5: Sobel |Gx| = 400 on the
        // two columns adjacent to the edge.
        let luma = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([0]) } else { Luma([100]) });
        let energy = gradient_energy(&luma).unwrap_or_default();
        // 2 of 8 interior columns respond with 400.
        assert!((energy - 100.0).abs() < 1e-9, "got {energy}");
    }

    #[test]
    fn test_checkerboard_sharper_than_blurred() {
        let sharp = checkerboard(64, 64, 4);
        let blurred = imageops::blur(&sharp, 3.0);
        let scorer = SharpnessScorer::default();
        assert!(scorer.score_luma(&sharp, &[]) > scorer.score_luma(&blurred, &[]));
    }

    #[test]
    fn test_too_small_raster() {
        let luma = GrayImage::from_pixel(2, 10, Luma([10]));
        assert_eq!(gradient_energy(&luma), None);
        assert!(SharpnessScorer::default().score_luma(&luma, &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_region_outside_raster_scores_zero() {
        let luma = checkerboard(32, 32, 2);
        let scorer = SharpnessScorer::default();
        let score = scorer.score_luma(&luma, &[Region::new(100, 100, 20, 20)]);
        assert!(score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_regions_are_averaged() {
        // Left half textured, right half flat.
        let luma = GrayImage::from_fn(80, 40, |x, y| {
            if x < 40 && (x / 2 + y / 2) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let scorer = SharpnessScorer::default();
        let textured = scorer.score_luma(&luma, &[Region::new(0, 0, 40, 40)]);
        let flat = scorer.score_luma(&luma, &[Region::new(40, 0, 40, 40)]);
        let both = scorer.score_luma(
            &luma,
            &[Region::new(0, 0, 40, 40), Region::new(40, 0, 40, 40)],
        );
        assert!(textured > 0.0);
        assert!(flat.abs() < f64::EPSILON);
        assert!((both - (textured + flat) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unusable_region_is_skipped_not_averaged() {
        let luma = checkerboard(40, 40, 2);
        let scorer = SharpnessScorer::default();
        let alone = scorer.score_luma(&luma, &[Region::new(0, 0, 40, 40)]);
        let with_bad = scorer.score_luma(
            &luma,
            &[Region::new(0, 0, 40, 40), Region::new(500, 500, 10, 10)],
        );
        assert!((alone - with_bad).abs() < 1e-9);
    }
}
