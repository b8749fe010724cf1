//! Optional capabilities available to the engine.

use serde::{Deserialize, Serialize};

/// Which optional analyses are available for this run.
///
/// Decided once at startup and injected into the engine, so a missing
/// detector model or a disabled estimator is visible in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// A subject detector is loaded and usable.
    pub subject_detection: bool,
    /// Tilt estimation is enabled.
    pub tilt_detection: bool,
}

impl Capabilities {
    /// All capabilities enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            subject_detection: true,
            tilt_detection: true,
        }
    }

    /// No optional capability.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            subject_detection: false,
            tilt_detection: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}
