//! Per-photo analysis components.
//!
//! Each component is a pure function of a decoded raster (or of scores) and
//! the configuration it was built with.

mod exposure;
mod selection;
mod sharpness;
mod stats;
mod tilt;

pub use exposure::{ExposureClass, ExposureGate, Histogram};
pub use selection::{Scores, SelectionPolicy};
pub use sharpness::{gradient_energy, SharpnessConfig, SharpnessScorer};
pub use stats::{Distribution, SceneStats, SharpnessStats, SubjectStats, SubjectSuggestions};
pub use tilt::{line_tilt, median, normalize_hough_angle, TiltConfig, TiltEstimator};
