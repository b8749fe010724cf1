//! Rotation-compensated crop geometry.
//!
//! Straightening a photo rotates it on an expanded canvas, which leaves
//! empty corners. The canvas is then zoomed until the rotated content covers
//! a centred window of the original size, and that window is cropped out.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use serde::Serialize;

/// Extra zoom applied on top of the rotation compensation.
pub const ZOOM_MARGIN: f64 = 1.10;

const COVER_EPSILON: f64 = 1e-9;
const MIN_DENOMINATOR: f64 = 1e-9;

fn aspect_ratios(width: u32, height: u32) -> (f64, f64) {
    let r = f64::from(width) / f64::from(height);
    (r.min(1.0 / r), r.max(1.0 / r))
}

/// Zoom factor `1.10 / (cos θ - sin θ * min(W/H, H/W))`.
///
/// Returns `None` for empty frames or when the denominator is not positive
/// (a square frame at 45 degrees, or anything steeper).
#[must_use]
pub fn crop_scale(width: u32, height: u32, angle_deg: f64) -> Option<f64> {
    if width == 0 || height == 0 || !angle_deg.is_finite() {
        return None;
    }
    let theta = angle_deg.abs().to_radians();
    let (min_ratio, _) = aspect_ratios(width, height);
    let denominator = theta.sin().mul_add(-min_ratio, theta.cos());
    (denominator > MIN_DENOMINATOR).then(|| ZOOM_MARGIN / denominator)
}

/// Smallest zoom at which content rotated by `angle_deg` covers the frame:
/// `cos θ + sin θ * max(W/H, H/W)`.
#[must_use]
pub fn cover_scale(width: u32, height: u32, angle_deg: f64) -> f64 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    let theta = angle_deg.abs().to_radians();
    let (_, max_ratio) = aspect_ratios(width, height);
    theta.sin().mul_add(max_ratio, theta.cos())
}

/// Checks all four frame corners against the zoomed, rotated content.
#[must_use]
pub fn covers_frame(width: u32, height: u32, angle_deg: f64, scale: f64) -> bool {
    let theta = angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    let half_w = f64::from(width) / 2.0;
    let half_h = f64::from(height) / 2.0;

    [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)]
        .iter()
        .all(|&(sx, sy)| {
            let (x, y) = (sx * half_w, sy * half_h);
            // Corner in the content's own frame.
            let u = x.mul_add(cos, y * sin);
            let v = (-x).mul_add(sin, y * cos);
            u.abs() <= scale.mul_add(half_w, COVER_EPSILON)
                && v.abs() <= scale.mul_add(half_h, COVER_EPSILON)
        })
}

/// Canvas sizes and crop window for straightening one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropPlan {
    /// Tilt being corrected, in degrees.
    pub angle: f64,
    /// Width of the rotated, expanded canvas.
    pub expanded_width: u32,
    /// Height of the rotated, expanded canvas.
    pub expanded_height: u32,
    /// Zoom applied to the expanded canvas.
    pub scale: f64,
    /// Width after zooming.
    pub zoomed_width: u32,
    /// Height after zooming.
    pub zoomed_height: u32,
    /// Left edge of the crop window in the zoomed canvas.
    pub crop_x: u32,
    /// Top edge of the crop window in the zoomed canvas.
    pub crop_y: u32,
    /// Output width (original width).
    pub width: u32,
    /// Output height (original height).
    pub height: u32,
}

impl CropPlan {
    /// Plans the straightening of a `width x height` frame.
    ///
    /// The zoom is the larger of [`crop_scale`] and [`cover_scale`], so very
    /// wide frames still end up without empty corners.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(width: u32, height: u32, angle_deg: f64) -> Option<Self> {
        let legacy = crop_scale(width, height, angle_deg)?;
        let scale = legacy.max(cover_scale(width, height, angle_deg));

        let (sin, cos) = angle_deg.abs().to_radians().sin_cos();
        let (w, h) = (f64::from(width), f64::from(height));
        let expanded_width = w.mul_add(cos, h * sin).ceil().max(w);
        let expanded_height = w.mul_add(sin, h * cos).ceil().max(h);

        let zoomed_width = (expanded_width * scale).floor().max(w);
        let zoomed_height = (expanded_height * scale).floor().max(h);

        // Bounded by a few multiples of the u32 input dimensions.
        let zoomed_width = zoomed_width.min(f64::from(u32::MAX)) as u32;
        let zoomed_height = zoomed_height.min(f64::from(u32::MAX)) as u32;

        Some(Self {
            angle: angle_deg,
            expanded_width: expanded_width as u32,
            expanded_height: expanded_height as u32,
            scale,
            zoomed_width,
            zoomed_height,
            crop_x: (zoomed_width - width) / 2,
            crop_y: (zoomed_height - height) / 2,
            width,
            height,
        })
    }
}

/// Rotates `image` to cancel `angle_deg` of tilt and crops back to its size.
///
/// Returns `None` when the tilt is too large to compensate.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn straighten(image: &DynamicImage, angle_deg: f64) -> Option<RgbImage> {
    let rgb = image.to_rgb8();
    let plan = CropPlan::compute(rgb.width(), rgb.height(), angle_deg)?;

    let mut canvas = RgbImage::from_pixel(plan.expanded_width, plan.expanded_height, Rgb([0, 0, 0]));
    let offset_x = i64::from((plan.expanded_width - plan.width) / 2);
    let offset_y = i64::from((plan.expanded_height - plan.height) / 2);
    imageops::replace(&mut canvas, &rgb, offset_x, offset_y);

    // Positive tilt descends to the right, so it is undone counter-clockwise.
    let rotated = rotate_about_center(
        &canvas,
        (-angle_deg).to_radians() as f32,
        Interpolation::Bicubic,
        Rgb([0, 0, 0]),
    );
    let zoomed = imageops::resize(
        &rotated,
        plan.zoomed_width,
        plan.zoomed_height,
        FilterType::CatmullRom,
    );

    Some(imageops::crop_imm(&zoomed, plan.crop_x, plan.crop_y, plan.width, plan.height).to_image())
}
