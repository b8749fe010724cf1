//! End-to-end engine scenarios over mock ports.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use photo_cull_core::analysis::{SharpnessScorer, TiltEstimator};
use photo_cull_core::domain::{
    Capabilities, ImageInfo, Region, RejectionReason, SelectionThresholds,
};
use photo_cull_core::geometry::straighten;
use photo_cull_core::ports::{SidecarWriter, SubjectDetector};
use photo_cull_core::sidecar::{attribute_value, verify, InjectionStrategy, SidecarGenerator};
use photo_cull_core::{Engine, EngineSettings};
use photo_cull_test_support::{
    FailingDetector, MockProgressSink, MockRawDecoder, MockSidecarWriter, MockSubjectDetector,
    SyntheticImageBuilder,
};

fn engine(decoder: MockRawDecoder, detector: Option<Arc<dyn SubjectDetector>>) -> Engine {
    Engine::new(
        Arc::new(decoder),
        detector,
        Capabilities::all(),
        SelectionThresholds::default(),
        EngineSettings::default(),
    )
}

#[test]
fn sharp_landscape_with_one_face_is_selected() {
    let decoder = MockRawDecoder::new().with_image("a.arw", SyntheticImageBuilder::sharp_photo());
    let detector: Arc<dyn SubjectDetector> = Arc::new(MockSubjectDetector::centered(160, 120));
    let result = engine(decoder, Some(detector)).analyze_path(Path::new("a.arw"));

    assert!(result.selected);
    assert!(result.reasons.is_empty());
    assert_eq!(result.face_count, 1);
    assert!(result.is_sharp);
    assert!(result.sharpness > 15.0);
    assert!(!result.is_too_dark && !result.is_burned_out);
}

#[test]
fn sharp_photo_without_face_is_rejected_for_no_subject_only() {
    let decoder = MockRawDecoder::new().with_image("a.arw", SyntheticImageBuilder::sharp_photo());
    let detector: Arc<dyn SubjectDetector> = Arc::new(MockSubjectDetector::empty());
    let result = engine(decoder, Some(detector)).analyze_path(Path::new("a.arw"));

    assert!(!result.selected);
    assert_eq!(
        result.reasons.iter().copied().collect::<Vec<_>>(),
        vec![RejectionReason::NoSubject]
    );
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["reasons"], serde_json::json!(["no subject"]));
}

#[test]
fn every_failing_conjunct_is_reported() {
    let decoder =
        MockRawDecoder::new().with_image("dark.arw", SyntheticImageBuilder::uniform_gray(60, 90, 5));
    let detector: Arc<dyn SubjectDetector> = Arc::new(MockSubjectDetector::empty());
    let engine = Engine::new(
        Arc::new(decoder),
        Some(detector),
        Capabilities::all(),
        SelectionThresholds {
            require_horizontal: true,
            ..SelectionThresholds::default()
        },
        EngineSettings::default(),
    );
    let result = engine.analyze_path(Path::new("dark.arw"));

    assert!(!result.selected);
    assert!(result.is_too_dark);
    assert!(result.sharpness.abs() < f64::EPSILON);
    assert_eq!(result.reasons.len(), 4);
    assert!(result.reasons.contains(&RejectionReason::Vertical));
}

#[test]
fn optional_subject_selects_sharp_photo_without_detector() {
    let decoder = MockRawDecoder::new().with_image("a.arw", SyntheticImageBuilder::sharp_photo());
    let engine = Engine::new(
        Arc::new(decoder),
        None,
        Capabilities::all(),
        SelectionThresholds {
            require_subject: false,
            ..SelectionThresholds::default()
        },
        EngineSettings::default(),
    );
    assert!(!engine.capabilities().subject_detection);
    assert!(engine.analyze_path(Path::new("a.arw")).selected);
}

#[test]
fn failures_are_isolated_in_a_batch() {
    let decoder = MockRawDecoder::new()
        .with_image("0.arw", SyntheticImageBuilder::sharp_photo())
        .with_image("2.arw", SyntheticImageBuilder::blurry_photo());
    let detector: Arc<dyn SubjectDetector> = Arc::new(MockSubjectDetector::centered(160, 120));
    let engine = engine(decoder, Some(detector));
    let paths: Vec<PathBuf> = ["0.arw", "1.arw", "2.arw"].iter().map(PathBuf::from).collect();
    let progress = MockProgressSink::new();

    let results = engine.analyze_batch(&paths, &progress);

    assert_eq!(results.len(), 3);
    assert!(results[0].selected);
    assert!(results[1].is_failed());
    assert!(results[1].reasons.is_empty());
    assert!(!results[2].selected);
    assert!(results[2].error.is_none());

    assert_eq!(progress.started_count(), 3);
    assert_eq!(progress.completed_count(), 3);
    assert_eq!(progress.finished_counts(), Some((2, 1, 1)));
}

#[test]
fn detector_failure_produces_error_record() {
    let decoder = MockRawDecoder::new().with_image("a.arw", SyntheticImageBuilder::sharp_photo());
    let detector: Arc<dyn SubjectDetector> = Arc::new(FailingDetector);
    let result = engine(decoder, Some(detector)).analyze_path(Path::new("a.arw"));

    assert!(result.is_failed());
    assert!(!result.selected);
    assert!((result.brightness - 128.0).abs() < f64::EPSILON);
    assert!(result.error.unwrap().contains("detector exploded"));
}

#[test]
fn sharpness_is_restricted_to_subject_regions() {
    let subject = Region::new(40, 30, 60, 60);
    let image = SyntheticImageBuilder::sharp_subject(200, 150, subject);
    let scorer = SharpnessScorer::default();

    let whole = scorer.score(&image, &[]);
    let focused = scorer.score(&image, &[subject]);
    assert!(focused > whole * 2.0, "focused {focused}, whole {whole}");

    let outside = scorer.score(&image, &[Region::new(150, 100, 40, 40)]);
    assert!(outside.abs() < f64::EPSILON);
}

#[test]
fn tilted_horizon_is_measured() {
    let image = SyntheticImageBuilder::horizon(400, 300, 5.0);
    let tilt = TiltEstimator::default().estimate(&image);
    assert!(tilt.abs() < 10.0);
    assert!((tilt.abs() - 5.0).abs() < 1.5, "got {tilt}");
}

#[test]
fn horizon_descending_right_has_positive_tilt() {
    let estimator = TiltEstimator::default();

    let descending = estimator.estimate(&SyntheticImageBuilder::horizon(600, 400, 5.0));
    assert!((descending - 5.0).abs() < 1.5, "got {descending}");

    let ascending = estimator.estimate(&SyntheticImageBuilder::horizon(600, 400, -5.0));
    assert!((ascending + 5.0).abs() < 1.5, "got {ascending}");
}

#[test]
fn straightening_by_estimate_levels_horizon() {
    let estimator = TiltEstimator::default();
    let image = SyntheticImageBuilder::horizon(600, 400, 5.0);
    let before = estimator.estimate(&image);
    assert!(before > 3.5, "got {before}");

    let level = straighten(&image.image, before).unwrap();
    assert_eq!(level.dimensions(), (600, 400));
    let after = estimator.estimate(&ImageInfo::new("straightened", DynamicImage::ImageRgb8(level)));
    assert!(after.abs() < 1.0, "before {before}, after {after}");
}

#[test]
fn selected_photo_gets_straightened_sidecar() {
    let generator = SidecarGenerator::default();
    let writer = MockSidecarWriter::new();

    let document = generator.generate(5.0);
    assert_eq!(document.strategy, InjectionStrategy::AttributeTable);
    let path = writer.write(Path::new("shoot/a.arw"), &document).unwrap();
    assert_eq!(path, PathBuf::from("shoot/a.xmp"));

    let report = verify(&document.content);
    assert!(report.passed(), "missing {:?}", report.missing);
    assert_eq!(attribute_value(&document.content, "crs:StraightenAngle").as_deref(), Some("5.00"));
    assert_eq!(attribute_value(&document.content, "crs:HasCrop").as_deref(), Some("True"));
}

#[test]
fn level_photo_gets_template_unchanged() {
    let generator = SidecarGenerator::default();
    let document = generator.generate(0.05);
    assert_eq!(document.strategy, InjectionStrategy::Unchanged);
    assert_eq!(document.content, generator.template());
}

#[test]
fn single_pixel_scores_zero_sharpness() {
    let image = SyntheticImageBuilder::single_pixel(200);
    assert!(SharpnessScorer::default().score(&image, &[]).abs() < f64::EPSILON);
    assert!(SharpnessScorer::default()
        .score(&image, &[Region::new(0, 0, 1, 1)])
        .abs()
        < f64::EPSILON);
}
