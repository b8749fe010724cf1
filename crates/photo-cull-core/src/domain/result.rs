//! Analysis result types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::RejectionReason;

/// Neutral brightness reported when a photo could not be measured.
pub const NEUTRAL_BRIGHTNESS: f64 = 128.0;

/// Complete analysis result for a single photo.
///
/// `selected` and `reasons` are derived from the scores and the active
/// thresholds; they are never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Path to the analyzed file.
    pub path: String,
    /// Timestamp of analysis (RFC 3339, UTC).
    pub timestamp: String,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Gradient-energy sharpness score.
    pub sharpness: f64,
    /// Sharpness exceeded the threshold.
    pub is_sharp: bool,
    /// Landscape frame.
    pub is_horizontal: bool,
    /// Estimated tilt in degrees.
    pub tilt_angle: f64,
    /// Number of detected subjects.
    pub face_count: usize,
    /// Mean perceptual luminance (0-255).
    pub brightness: f64,
    /// Brightness below the minimum.
    pub is_too_dark: bool,
    /// Brightness above the maximum.
    pub is_burned_out: bool,
    /// Whether the photo is kept.
    pub selected: bool,
    /// Failed criteria, in reporting order.
    pub reasons: BTreeSet<RejectionReason>,
    /// Set when the photo could not be analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Terminal record for a photo that could not be analyzed.
    #[must_use]
    pub fn failed(path: impl Into<String>, error: impl ToString) -> Self {
        Self {
            path: path.into(),
            timestamp: iso_timestamp(),
            width: 0,
            height: 0,
            sharpness: 0.0,
            is_sharp: false,
            is_horizontal: false,
            tilt_angle: 0.0,
            face_count: 0,
            brightness: NEUTRAL_BRIGHTNESS,
            is_too_dark: false,
            is_burned_out: false,
            selected: false,
            reasons: BTreeSet::new(),
            error: Some(error.to_string()),
        }
    }

    /// Returns true if the photo could not be analyzed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Current UTC time in RFC 3339 format.
#[must_use]
pub fn iso_timestamp() -> String {
    match OffsetDateTime::now_utc().format(&Rfc3339) {
        Ok(ts) => ts,
        Err(_) => String::from("1970-01-01T00:00:00Z"),
    }
}
