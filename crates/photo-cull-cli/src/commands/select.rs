//! Select command - analyze photos and keep the good ones.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use photo_cull_adapters::models::FACE_DETECTOR;
use photo_cull_adapters::{
    model_path, set_models_dir, FileDecoder, FsPhotoSource, FsSidecarWriter, JpegExporter,
};
use photo_cull_core::analysis::{SharpnessConfig, TiltConfig};
use photo_cull_core::inference::{BlazeFaceConfig, BlazeFaceDetector};
use photo_cull_core::{
    AnalysisResult, Capabilities, Engine, EngineSettings, PhotoSource, RawDecoder, ResultOutput,
    SelectionThresholds, SidecarGenerator, SidecarWriter, SubjectDetector,
};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{summary, JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Hardcoded default values.
mod defaults {
    pub const SHARPNESS_THRESHOLD: f64 = 15.0;
    pub const BRIGHTNESS_MIN: f64 = 30.0;
    pub const BRIGHTNESS_MAX: f64 = 220.0;
    pub const MIN_FACE_CONFIDENCE: f32 = 0.75;
    pub const NMS_THRESHOLD: f32 = 0.3;
}

/// Parse a non-negative sharpness threshold.
fn parse_sharpness(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be a non-negative number"))
    }
}

/// Parse a brightness level (0-255).
fn parse_brightness(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=255.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0..=255"))
    }
}

/// Shared arguments for photo selection.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SelectArgs {
    /// Files or directories to analyze
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Minimum sharpness score for a keeper
    #[arg(long, value_parser = parse_sharpness)]
    pub sharpness_threshold: Option<f64>,

    /// Minimum mean brightness (0-255)
    #[arg(long, value_parser = parse_brightness)]
    pub brightness_min: Option<f64>,

    /// Maximum mean brightness (0-255)
    #[arg(long, value_parser = parse_brightness)]
    pub brightness_max: Option<f64>,

    /// Reject portrait and square frames
    #[arg(long)]
    pub horizontal_only: bool,

    /// Keep photos without a detected face
    #[arg(long)]
    pub allow_no_subject: bool,

    /// Disable tilt estimation
    #[arg(long)]
    pub no_tilt: bool,

    /// Disable face detection
    #[arg(long)]
    pub no_detector: bool,

    /// Custom XMP template for sidecars
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Write sidecars into this directory instead of next to the photos
    #[arg(long, value_name = "DIR")]
    pub sidecar_dir: Option<PathBuf>,

    /// Do not write sidecars
    #[arg(long)]
    pub no_sidecars: bool,

    /// Export straightened JPEGs of selected photos into this directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// JPEG quality for exports (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub threads: Option<usize>,

    /// Print sharpness statistics and threshold suggestions
    #[arg(long)]
    pub stats: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl SelectArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    ///
    /// Boolean flags set on the command line always win; config only
    /// applies when the flag was not given.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }
        args.threads = args.threads.or(config.general.threads);

        let selection = &config.selection;
        args.sharpness_threshold = args.sharpness_threshold.or(selection.sharpness_threshold);
        args.brightness_min = args.brightness_min.or(selection.brightness_min);
        args.brightness_max = args.brightness_max.or(selection.brightness_max);
        if !args.horizontal_only {
            args.horizontal_only = selection.horizontal_only.unwrap_or(false);
        }
        if !args.allow_no_subject {
            if let Some(required) = selection.require_subject {
                args.allow_no_subject = !required;
            }
        }

        if !args.no_tilt {
            if let Some(enabled) = config.tilt.enabled {
                args.no_tilt = !enabled;
            }
        }
        if !args.no_detector {
            if let Some(enabled) = config.detector.enabled {
                args.no_detector = !enabled;
            }
        }

        if !args.no_sidecars {
            if let Some(enabled) = config.sidecar.enabled {
                args.no_sidecars = !enabled;
            }
        }
        if args.template.is_none() {
            args.template.clone_from(&config.sidecar.template);
        }
        if args.sidecar_dir.is_none() {
            args.sidecar_dir.clone_from(&config.sidecar.dir);
        }

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        if !args.stats {
            args.stats = config.output.stats.unwrap_or(false);
        }
        if args.export_dir.is_none() {
            args.export_dir.clone_from(&config.output.export_dir);
        }
        args.jpeg_quality = args.jpeg_quality.or(config.output.jpeg_quality);

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        // Advanced settings are read from here by the engine builder.
        args.config = Some(config.clone());

        args
    }

    /// Selection thresholds with fallback to hardcoded defaults.
    ///
    /// A command-line range that is inverted after layering falls back to
    /// the defaults for both ends.
    fn thresholds(&self) -> SelectionThresholds {
        let (brightness_min, brightness_max) = match (
            self.brightness_min.unwrap_or(defaults::BRIGHTNESS_MIN),
            self.brightness_max.unwrap_or(defaults::BRIGHTNESS_MAX),
        ) {
            (min, max) if min <= max => (min, max),
            (min, max) => {
                warn!(
                    "brightness minimum {min} exceeds maximum {max}, using {}-{}",
                    defaults::BRIGHTNESS_MIN,
                    defaults::BRIGHTNESS_MAX
                );
                (defaults::BRIGHTNESS_MIN, defaults::BRIGHTNESS_MAX)
            }
        };

        SelectionThresholds {
            sharpness_min: self
                .sharpness_threshold
                .unwrap_or(defaults::SHARPNESS_THRESHOLD),
            brightness_min,
            brightness_max,
            require_horizontal: self.horizontal_only,
            require_subject: !self.allow_no_subject,
        }
    }

    /// Engine settings from the advanced config sections.
    fn settings(&self) -> EngineSettings {
        let config = self.config.as_ref();
        let mut sharpness = SharpnessConfig::default();
        let mut tilt = TiltConfig::default();

        if let Some(factor) = config.and_then(|c| c.selection.center_factor) {
            sharpness.center_factor = factor;
        }
        if let Some(votes) = config.and_then(|c| c.tilt.vote_threshold) {
            tilt.vote_threshold = votes;
        }
        if let Some(angle) = config.and_then(|c| c.tilt.max_angle) {
            tilt.max_angle = angle;
        }

        EngineSettings { sharpness, tilt }
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Outcome of a select run.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct SelectResult {
    /// Number of photos analyzed without error.
    pub processed: usize,
    /// Number of photos kept.
    pub selected: usize,
    /// Number of photos, sidecars or exports that failed.
    pub failed: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the select command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
///
/// # Errors
///
/// Returns an error for problems that stop the whole run, such as an
/// unreadable template or a failing output stream.
pub fn run(args: &SelectArgs) -> Result<SelectResult> {
    info!("Running select command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    if let Some(ref models_dir) = args.models_dir {
        debug!("Using custom models directory: {}", models_dir.display());
        set_models_dir(Some(models_dir.clone()));
    }

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("Could not configure {threads} worker threads: {e}");
        }
    }

    let generator = load_template(args.template.as_deref())?;

    let decoder: Arc<dyn RawDecoder> = Arc::new(FileDecoder::new());
    let detector = if args.no_detector {
        None
    } else {
        load_detector(args)
    };
    let capabilities = Capabilities {
        subject_detection: detector.is_some(),
        tilt_detection: !args.no_tilt,
    };
    let engine = Engine::new(
        Arc::clone(&decoder),
        detector,
        capabilities,
        args.thresholds(),
        args.settings(),
    );

    let source = FsPhotoSource::new(args.paths.clone(), args.recursive);
    let paths = source
        .photos()
        .collect::<Result<Vec<_>>>()
        .context("Failed to enumerate photos")?;
    if paths.is_empty() {
        warn!("No supported photos found");
    }

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(Some(paths.len() as u64), args.quiet, show_progress);

    let results = engine.analyze_batch(&paths, &progress);

    let output = JsonOutput::stdout(args.format(), args.pretty);
    for result in &results {
        output.write(result)?;
    }
    output.finish()?;

    let mut failed = results.iter().filter(|r| r.is_failed()).count();
    let selected: Vec<&AnalysisResult> = results.iter().filter(|r| r.selected).collect();
    failed += write_outputs(args, &selected, &generator, decoder.as_ref());

    if args.stats {
        eprint!(
            "{}",
            summary::render(&results, engine.thresholds().sharpness_min)
        );
    }

    let exit_code = if failed > 0 {
        ExitCode::PartialFailure
    } else {
        ExitCode::Success
    };

    Ok(SelectResult {
        processed: results.iter().filter(|r| !r.is_failed()).count(),
        selected: selected.len(),
        failed,
        exit_code,
    })
}

/// Reads the sidecar template, or uses the built-in preset.
fn load_template(path: Option<&Path>) -> Result<SidecarGenerator> {
    match path {
        Some(path) => {
            let template = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            debug!("Using sidecar template {}", path.display());
            Ok(SidecarGenerator::new(template))
        }
        None => Ok(SidecarGenerator::default()),
    }
}

/// Loads the face detector, or `None` with a warning when it is unusable.
fn load_detector(args: &SelectArgs) -> Option<Arc<dyn SubjectDetector>> {
    let config = args.config.as_ref();
    let detector_config = BlazeFaceConfig {
        score_threshold: config
            .and_then(|c| c.detector.min_confidence)
            .unwrap_or(defaults::MIN_FACE_CONFIDENCE),
        nms_threshold: config
            .and_then(|c| c.detector.nms_threshold)
            .unwrap_or(defaults::NMS_THRESHOLD),
    };

    let Some(path) = model_path(FACE_DETECTOR) else {
        warn!("Face detection disabled: unknown model configuration.");
        return None;
    };
    if !path.exists() {
        warn!(
            "Face detection disabled: {} not found. Run `photo-cull models fetch`.",
            path.display()
        );
        return None;
    }

    match BlazeFaceDetector::load(&path, detector_config) {
        Ok(detector) => {
            debug!("Loaded face detector from {}", path.display());
            Some(Arc::new(detector))
        }
        Err(e) => {
            warn!("Face detection disabled: {e:#}");
            None
        }
    }
}

/// Writes sidecars and exports for selected photos; returns the failure count.
fn write_outputs(
    args: &SelectArgs,
    selected: &[&AnalysisResult],
    generator: &SidecarGenerator,
    decoder: &dyn RawDecoder,
) -> usize {
    let sidecars = if args.no_sidecars {
        None
    } else {
        Some(
            args.sidecar_dir
                .as_ref()
                .map_or_else(FsSidecarWriter::beside_photos, FsSidecarWriter::into_dir),
        )
    };
    let exporter = args.export_dir.as_ref().map(|dir| {
        let exporter = JpegExporter::new(dir);
        match args.jpeg_quality {
            Some(quality) => exporter.with_quality(quality),
            None => exporter,
        }
    });

    let mut failed = 0;
    for result in selected {
        let source = Path::new(&result.path);

        if let Some(writer) = &sidecars {
            let document = generator.generate(result.tilt_angle);
            if let Err(e) = writer.write(source, &document) {
                warn!("{}: {e:#}", result.path);
                failed += 1;
            }
        }

        if let Some(exporter) = &exporter {
            let exported = decoder
                .decode(source)
                .and_then(|image| exporter.export(source, &image.image, result.tilt_angle));
            if let Err(e) = exported {
                warn!("{}: export failed: {e:#}", result.path);
                failed += 1;
            }
        }
    }

    failed
}
