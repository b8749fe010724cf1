//! Keep/reject thresholds and rejection reasons.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cutoffs controlling the keep/reject decision.
///
/// Supplied once per run and never mutated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionThresholds {
    /// Minimum sharpness score (exclusive).
    pub sharpness_min: f64,
    /// Minimum mean brightness (inclusive).
    pub brightness_min: f64,
    /// Maximum mean brightness (inclusive).
    pub brightness_max: f64,
    /// Reject photos that are not landscape.
    pub require_horizontal: bool,
    /// Reject photos without a detected subject.
    pub require_subject: bool,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            sharpness_min: 15.0,
            brightness_min: 30.0,
            brightness_max: 220.0,
            require_horizontal: false,
            require_subject: true,
        }
    }
}

/// Why a photo was not selected.
///
/// Variant order defines the order in which reasons are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// No subject was detected.
    #[serde(rename = "no subject")]
    NoSubject,
    /// Sharpness at or below the threshold.
    #[serde(rename = "not sharp enough")]
    NotSharp,
    /// Mean brightness below the minimum.
    #[serde(rename = "too dark")]
    TooDark,
    /// Mean brightness above the maximum.
    #[serde(rename = "burned out")]
    BurnedOut,
    /// Portrait or square frame while horizontal photos are required.
    #[serde(rename = "vertical orientation")]
    Vertical,
}

impl RejectionReason {
    /// Human-readable label, identical to the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoSubject => "no subject",
            Self::NotSharp => "not sharp enough",
            Self::TooDark => "too dark",
            Self::BurnedOut => "burned out",
            Self::Vertical => "vertical orientation",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the selection policy for one photo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decision {
    /// Whether the photo is kept.
    pub selected: bool,
    /// Every failed criterion; empty iff `selected`.
    pub reasons: BTreeSet<RejectionReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = SelectionThresholds::default();
        assert!((t.sharpness_min - 15.0).abs() < f64::EPSILON);
        assert!((t.brightness_min - 30.0).abs() < f64::EPSILON);
        assert!((t.brightness_max - 220.0).abs() < f64::EPSILON);
        assert!(!t.require_horizontal);
        assert!(t.require_subject);
    }

    #[test]
    fn test_reason_serializes_as_label() {
        for reason in [
            RejectionReason::NoSubject,
            RejectionReason::NotSharp,
            RejectionReason::TooDark,
            RejectionReason::BurnedOut,
            RejectionReason::Vertical,
        ] {
            let json = serde_json::to_string(&reason).unwrap_or_default();
            assert_eq!(json, format!("\"{reason}\""));
        }
    }

    #[test]
    fn test_reasons_are_ordered() {
        let set: BTreeSet<_> = [RejectionReason::Vertical, RejectionReason::NoSubject]
            .into_iter()
            .collect();
        let labels: Vec<_> = set.iter().map(|r| r.as_str()).collect();
        assert_eq!(labels, vec!["no subject", "vertical orientation"]);
    }
}
