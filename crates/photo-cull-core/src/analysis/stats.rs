//! Batch sharpness statistics and threshold suggestions.

use serde::Serialize;

use crate::domain::AnalysisResult;

/// Summary of a set of sharpness scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    /// Number of scores.
    pub count: usize,
    /// Smallest score.
    pub min: f64,
    /// 25th percentile.
    pub p25: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub p75: f64,
    /// Largest score.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

impl Distribution {
    /// Summarizes `values`, or `None` when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let count = values.len();
        Some(Self {
            count,
            min: values[0],
            p25: percentile(&values, 25.0),
            median: percentile(&values, 50.0),
            p75: percentile(&values, 75.0),
            max: values[count - 1],
            mean: values.iter().sum::<f64>() / count as f64,
        })
    }
}

/// Thresholds suggested for photos with subjects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectSuggestions {
    /// Keeps roughly three quarters of the batch.
    pub conservative: f64,
    /// 60% of the median.
    pub moderate: f64,
    /// 80% of the median.
    pub strict: f64,
}

/// Sharpness statistics for photos with detected subjects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectStats {
    /// Score distribution.
    pub distribution: Distribution,
    /// Suggested thresholds.
    pub suggested: SubjectSuggestions,
}

/// Sharpness statistics for photos without subjects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneStats {
    /// Score distribution.
    pub distribution: Distribution,
    /// Suggested threshold, 70% of the median.
    pub suggested: f64,
}

/// Batch statistics used to tune the sharpness threshold.
///
/// Only results with a positive sharpness take part; failed photos score 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SharpnessStats {
    /// Photos with at least one subject.
    pub with_subject: Option<SubjectStats>,
    /// Photos without subjects.
    pub without_subject: Option<SceneStats>,
}

impl SharpnessStats {
    /// Computes statistics over a batch of results.
    #[must_use]
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let (with, without): (Vec<&AnalysisResult>, Vec<&AnalysisResult>) = results
            .iter()
            .filter(|r| r.sharpness > 0.0)
            .partition(|r| r.face_count > 0);

        let with_subject = Distribution::from_values(with.iter().map(|r| r.sharpness).collect())
            .map(|distribution| SubjectStats {
                distribution,
                suggested: SubjectSuggestions {
                    conservative: distribution.p25,
                    moderate: distribution.median * 0.6,
                    strict: distribution.median * 0.8,
                },
            });

        let without_subject =
            Distribution::from_values(without.iter().map(|r| r.sharpness).collect()).map(
                |distribution| SceneStats {
                    distribution,
                    suggested: distribution.median * 0.7,
                },
            );

        Self {
            with_subject,
            without_subject,
        }
    }

    /// Returns true if no result contributed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.with_subject.is_none() && self.without_subject.is_none()
    }
}

/// Linear-interpolation percentile of sorted, non-empty values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - rank.floor();
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
