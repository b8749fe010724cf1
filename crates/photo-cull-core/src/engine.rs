//! Per-photo pipeline and parallel batch runner.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::{
    ExposureGate, Scores, SelectionPolicy, SharpnessConfig, SharpnessScorer, TiltConfig,
    TiltEstimator,
};
use crate::domain::{
    iso_timestamp, AnalysisError, AnalysisResult, Capabilities, ImageInfo, Region,
    SelectionThresholds,
};
use crate::ports::{ProgressEvent, ProgressSink, RawDecoder, SubjectDetector};

/// Tuning of the individual analysis components.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSettings {
    /// Sharpness scorer settings.
    pub sharpness: SharpnessConfig,
    /// Tilt estimator settings.
    pub tilt: TiltConfig,
}

/// Photo quality analysis and selection engine.
///
/// Holds shared, read-only collaborators; one engine serves every worker
/// thread of a batch.
pub struct Engine {
    decoder: Arc<dyn RawDecoder>,
    detector: Option<Arc<dyn SubjectDetector>>,
    capabilities: Capabilities,
    policy: SelectionPolicy,
    sharpness: SharpnessScorer,
    tilt: TiltEstimator,
    exposure: ExposureGate,
}

impl Engine {
    /// Builds an engine.
    ///
    /// Subject detection is only enabled when `capabilities` allows it and a
    /// detector is supplied.
    #[must_use]
    pub fn new(
        decoder: Arc<dyn RawDecoder>,
        detector: Option<Arc<dyn SubjectDetector>>,
        capabilities: Capabilities,
        thresholds: SelectionThresholds,
        settings: EngineSettings,
    ) -> Self {
        let detector = detector.filter(|_| capabilities.subject_detection);
        let capabilities = Capabilities {
            subject_detection: detector.is_some(),
            ..capabilities
        };

        if !capabilities.subject_detection && thresholds.require_subject {
            warn!(
                "Subject detection is unavailable but a subject is required: \
                 every photo will be rejected as \"no subject\""
            );
        }
        info!(
            subject_detection = capabilities.subject_detection,
            tilt_detection = capabilities.tilt_detection,
            "Engine ready"
        );

        Self {
            decoder,
            detector,
            capabilities,
            policy: SelectionPolicy::new(thresholds),
            sharpness: SharpnessScorer::new(settings.sharpness),
            tilt: TiltEstimator::new(settings.tilt),
            exposure: ExposureGate,
        }
    }

    /// Capabilities in effect.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Thresholds in effect.
    #[must_use]
    pub const fn thresholds(&self) -> &SelectionThresholds {
        self.policy.thresholds()
    }

    /// Analyzes one photo.
    ///
    /// Never fails: decode, detection and analysis failures produce a
    /// terminal record carrying the error.
    #[must_use]
    pub fn analyze_path(&self, path: &Path) -> AnalysisResult {
        match self.try_analyze(path) {
            Ok(result) => result,
            Err(e) => {
                warn!("{}: {e}", path.display());
                AnalysisResult::failed(path.display().to_string(), e)
            }
        }
    }

    /// Analyzes an already decoded raster.
    ///
    /// # Errors
    ///
    /// Returns an error if the raster is empty or subject detection fails.
    pub fn analyze_image(&self, image: &ImageInfo) -> Result<AnalysisResult, AnalysisError> {
        if image.width == 0 || image.height == 0 {
            return Err(AnalysisError::Analysis(String::from("decoded raster is empty")));
        }

        let regions: Vec<Region> = match &self.detector {
            Some(detector) => detector.detect(image).map_err(AnalysisError::Detection)?,
            None => Vec::new(),
        };

        let luma = image.to_luma8();
        let sharpness = self.sharpness.score_luma(&luma, &regions);
        let tilt_angle = if self.capabilities.tilt_detection {
            self.tilt.estimate_luma(&luma)
        } else {
            0.0
        };
        let brightness = self.exposure.brightness(image);
        let exposure = self.exposure.classify(brightness, self.policy.thresholds());

        let scores = Scores {
            sharpness,
            face_count: regions.len(),
            brightness,
            is_horizontal: image.is_horizontal(),
        };
        let decision = self.policy.decide(&scores);

        debug!(
            path = %image.path,
            sharpness,
            faces = scores.face_count,
            brightness,
            tilt_angle,
            selected = decision.selected,
            "Photo analyzed"
        );

        Ok(AnalysisResult {
            path: image.path.clone(),
            timestamp: iso_timestamp(),
            width: image.width,
            height: image.height,
            sharpness,
            is_sharp: self.policy.is_sharp(sharpness),
            is_horizontal: scores.is_horizontal,
            tilt_angle,
            face_count: scores.face_count,
            brightness,
            is_too_dark: exposure.is_too_dark,
            is_burned_out: exposure.is_burned_out,
            selected: decision.selected,
            reasons: decision.reasons,
            error: None,
        })
    }

    fn try_analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let image = self.decoder.decode(path).map_err(AnalysisError::Decode)?;
        self.analyze_image(&image)
    }

    /// Analyzes photos in parallel, returning results in input order.
    pub fn analyze_batch(&self, paths: &[PathBuf], progress: &dyn ProgressSink) -> Vec<AnalysisResult> {
        let total = paths.len();
        let started = AtomicUsize::new(0);

        let results: Vec<AnalysisResult> = paths
            .par_iter()
            .map(|path| {
                let index = started.fetch_add(1, Ordering::Relaxed);
                progress.on_event(ProgressEvent::Started {
                    path: path.display().to_string(),
                    index,
                    total: Some(total),
                });

                let result = self.analyze_path(path);
                progress.on_event(ProgressEvent::Completed {
                    result: Box::new(result.clone()),
                });
                result
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_failed()).count();
        let selected = results.iter().filter(|r| r.selected).count();
        progress.on_event(ProgressEvent::Finished {
            processed: total - failed,
            failed,
            selected,
        });
        info!(total, selected, failed, "Batch complete");

        results
    }
}
