//! Subject regions in raster pixel coordinates.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `(x, y, width, height)` in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Creates a new region.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Central part of the region with symmetric padding, clipped to a
    /// `bounds_width x bounds_height` raster.
    ///
    /// `factor` is the kept fraction of each side; padding per side is
    /// `floor(side * (1 - factor) / 2)`. Returns `None` when nothing of the
    /// padded region lies inside the raster.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn center_crop(&self, factor: f64, bounds_width: u32, bounds_height: u32) -> Option<Self> {
        let factor = factor.clamp(0.0, 1.0);
        let pad_x = (f64::from(self.width) * (1.0 - factor) / 2.0) as u64;
        let pad_y = (f64::from(self.height) * (1.0 - factor) / 2.0) as u64;

        let x1 = u64::from(self.x) + pad_x;
        let y1 = u64::from(self.y) + pad_y;
        let x2 = (u64::from(self.x) + u64::from(self.width))
            .saturating_sub(pad_x)
            .min(u64::from(bounds_width));
        let y2 = (u64::from(self.y) + u64::from(self.height))
            .saturating_sub(pad_y)
            .min(u64::from(bounds_height));

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        // All values are bounded by the u32 raster dimensions.
        Some(Self {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}
