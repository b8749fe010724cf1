//! Tilt estimation.
//!
//! Finds dominant straight lines with Canny edges and a Hough transform and
//! reports how far the near-horizontal and near-vertical ones are from level.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;

use crate::domain::ImageInfo;

/// Configuration for tilt estimation.
#[derive(Debug, Clone, Copy)]
pub struct TiltConfig {
    /// Canny low hysteresis threshold.
    pub canny_low: f32,
    /// Canny high hysteresis threshold.
    pub canny_high: f32,
    /// Minimum Hough accumulator votes for a line.
    pub vote_threshold: u32,
    /// Non-maximum suppression radius in the Hough accumulator.
    pub suppression_radius: u32,
    /// Candidates at or beyond this absolute angle (degrees) are ignored.
    pub max_angle: f64,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            vote_threshold: 100,
            suppression_radius: 1,
            max_angle: 10.0,
        }
    }
}

/// Hough-based tilt estimator.
#[derive(Debug, Clone, Default)]
pub struct TiltEstimator {
    config: TiltConfig,
}

impl TiltEstimator {
    /// Creates a new estimator with the given configuration.
    #[must_use]
    pub const fn new(config: TiltConfig) -> Self {
        Self { config }
    }

    /// Estimates the signed tilt of a raster in degrees.
    #[must_use]
    pub fn estimate(&self, image: &ImageInfo) -> f64 {
        self.estimate_luma(&image.to_luma8())
    }

    /// Estimates the signed tilt of a luminance raster in degrees.
    ///
    /// Returns 0 when no line survives filtering.
    #[must_use]
    pub fn estimate_luma(&self, luma: &GrayImage) -> f64 {
        if luma.width() < 3 || luma.height() < 3 {
            return 0.0;
        }

        let edges = canny(luma, self.config.canny_low, self.config.canny_high);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.config.vote_threshold,
                suppression_radius: self.config.suppression_radius,
            },
        );

        let angles: Vec<f64> = lines
            .iter()
            .map(line_tilt)
            .filter(|a| a.abs() < self.config.max_angle)
            .collect();

        debug!(
            lines = lines.len(),
            candidates = angles.len(),
            "Hough line candidates"
        );

        median(angles).unwrap_or(0.0)
    }
}

/// Deviation of a Hough line from level, in degrees within `[-45, 45]`.
///
/// The Hough angle is the angle of the line normal, so a horizontal line
/// has 90 and a vertical line 0 or 180.
#[must_use]
pub fn line_tilt(line: &PolarLine) -> f64 {
    normalize_hough_angle(f64::from(line.angle_in_degrees))
}

/// Maps a Hough normal angle (degrees, `[0, 180)`) to a tilt in `[-45, 45]`.
#[must_use]
pub fn normalize_hough_angle(theta: f64) -> f64 {
    let a = theta - 90.0;
    if a > 45.0 {
        a - 90.0
    } else if a < -45.0 {
        a + 90.0
    } else {
        a
    }
}

/// Median of the values, averaging the two middle values for even counts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
