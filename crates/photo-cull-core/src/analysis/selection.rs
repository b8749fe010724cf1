//! Selection policy.

use crate::domain::{Decision, RejectionReason, SelectionThresholds};

/// Scores the policy decides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Sharpness score.
    pub sharpness: f64,
    /// Number of detected subjects.
    pub face_count: usize,
    /// Mean brightness.
    pub brightness: f64,
    /// Landscape frame.
    pub is_horizontal: bool,
}

/// Keep/reject policy over fixed thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionPolicy {
    thresholds: SelectionThresholds,
}

impl SelectionPolicy {
    /// Creates a policy for the given thresholds.
    #[must_use]
    pub const fn new(thresholds: SelectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the thresholds this policy applies.
    #[must_use]
    pub const fn thresholds(&self) -> &SelectionThresholds {
        &self.thresholds
    }

    /// Sharpness strictly above the threshold.
    #[must_use]
    pub fn is_sharp(&self, sharpness: f64) -> bool {
        sharpness > self.thresholds.sharpness_min
    }

    /// Decides whether a photo is kept.
    ///
    /// Every criterion is evaluated, so `reasons` lists all failures.
    #[must_use]
    pub fn decide(&self, scores: &Scores) -> Decision {
        let t = &self.thresholds;
        let mut decision = Decision::default();

        if t.require_subject && scores.face_count == 0 {
            decision.reasons.insert(RejectionReason::NoSubject);
        }
        if !self.is_sharp(scores.sharpness) {
            decision.reasons.insert(RejectionReason::NotSharp);
        }
        if scores.brightness < t.brightness_min {
            decision.reasons.insert(RejectionReason::TooDark);
        }
        if scores.brightness > t.brightness_max {
            decision.reasons.insert(RejectionReason::BurnedOut);
        }
        if t.require_horizontal && !scores.is_horizontal {
            decision.reasons.insert(RejectionReason::Vertical);
        }

        decision.selected = decision.reasons.is_empty();
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn scores(sharpness: f64, face_count: usize, brightness: f64, is_horizontal: bool) -> Scores {
        Scores {
            sharpness,
            face_count,
            brightness,
            is_horizontal,
        }
    }

    #[test]
    fn test_all_conjunct_combinations() {
        for require_horizontal in [false, true] {
            let policy = SelectionPolicy::new(SelectionThresholds {
                require_horizontal,
                ..SelectionThresholds::default()
            });
            for has_face in [false, true] {
                for sharp in [false, true] {
                    for exposed in [false, true] {
                        for horizontal in [false, true] {
                            let s = scores(
                                if sharp { 40.0 } else { 10.0 },
                                usize::from(has_face),
                                if exposed { 120.0 } else { 10.0 },
                                horizontal,
                            );
                            let expected =
                                has_face && sharp && exposed && (!require_horizontal || horizontal);
                            let decision = policy.decide(&s);
                            assert_eq!(decision.selected, expected, "{s:?} h={require_horizontal}");
                            assert_eq!(decision.selected, decision.reasons.is_empty());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_sharpness_threshold_is_exclusive() {
        let policy = SelectionPolicy::default();
        let decision = policy.decide(&scores(15.0, 1, 100.0, true));
        assert!(!decision.selected);
        assert!(decision.reasons.contains(&RejectionReason::NotSharp));
        assert!(policy.decide(&scores(15.01, 1, 100.0, true)).selected);
    }

    #[test]
    fn test_brightness_bounds_are_inclusive() {
        let policy = SelectionPolicy::default();
        assert!(policy.decide(&scores(40.0, 1, 30.0, true)).selected);
        assert!(policy.decide(&scores(40.0, 1, 220.0, true)).selected);
    }

    #[test]
    fn test_reasons_accumulate() {
        let policy = SelectionPolicy::new(SelectionThresholds {
            require_horizontal: true,
            ..SelectionThresholds::default()
        });
        let decision = policy.decide(&scores(1.0, 0, 250.0, false));
        let labels: Vec<_> = decision.reasons.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec!["no subject", "not sharp enough", "burned out", "vertical orientation"]
        );
    }

    #[test]
    fn test_vertical_allowed_by_default() {
        let decision = SelectionPolicy::default().decide(&scores(42.0, 1, 150.0, false));
        assert!(decision.selected);
    }

    #[test]
    fn test_subject_not_required() {
        let policy = SelectionPolicy::new(SelectionThresholds {
            require_subject: false,
            ..SelectionThresholds::default()
        });
        assert!(policy.decide(&scores(42.0, 0, 150.0, true)).selected);
    }

    fn portrait_thresholds() -> SelectionThresholds {
        SelectionThresholds {
            sharpness_min: 20.0,
            brightness_min: 30.0,
            brightness_max: 220.0,
            require_horizontal: false,
            require_subject: true,
        }
    }

    #[test]
    fn test_single_face_scenario() {
        let policy = SelectionPolicy::new(portrait_thresholds());
        let decision = policy.decide(&scores(42.0, 1, 150.0, false));
        assert!(decision.selected);
        assert!(decision.reasons.is_empty());
    }

    #[test]
    fn test_zero_faces_scenario() {
        let policy = SelectionPolicy::new(portrait_thresholds());
        let decision = policy.decide(&scores(80.0, 0, 150.0, true));
        assert!(!decision.selected);
        assert_eq!(
            decision.reasons.into_iter().collect::<Vec<_>>(),
            vec![RejectionReason::NoSubject]
        );
    }
}
