//! Configuration file support for photo-cull.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/photo-cull/config.toml` (lowest priority)
//! - Project-local: `.photo-cull.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".photo-cull.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Selection thresholds.
    pub selection: SelectionConfig,
    /// Tilt estimation settings.
    pub tilt: TiltConfig,
    /// Face detector settings.
    pub detector: DetectorConfig,
    /// Sidecar generation settings.
    pub sidecar: SidecarConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
    /// Worker threads for analysis.
    pub threads: Option<usize>,
}

/// Selection thresholds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Minimum sharpness score (exclusive).
    pub sharpness_threshold: Option<f64>,
    /// Minimum mean brightness (0-255).
    pub brightness_min: Option<f64>,
    /// Maximum mean brightness (0-255).
    pub brightness_max: Option<f64>,
    /// Reject vertical frames.
    pub horizontal_only: Option<bool>,
    /// Require at least one detected face.
    pub require_subject: Option<bool>,
    /// Kept fraction of each face box side when scoring sharpness.
    pub center_factor: Option<f64>,
}

/// Tilt estimation configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Enable/disable tilt estimation.
    pub enabled: Option<bool>,
    /// Minimum Hough votes for a line.
    pub vote_threshold: Option<u32>,
    /// Lines steeper than this (degrees) are ignored.
    pub max_angle: Option<f64>,
}

/// Face detector configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Enable/disable face detection.
    pub enabled: Option<bool>,
    /// Minimum face confidence (0.0-1.0).
    pub min_confidence: Option<f32>,
    /// IoU above which overlapping faces are merged (0.0-1.0).
    pub nms_threshold: Option<f32>,
}

/// Sidecar configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Write sidecars for selected photos.
    pub enabled: Option<bool>,
    /// Custom XMP template.
    pub template: Option<PathBuf>,
    /// Directory receiving sidecars instead of the photo directory.
    pub dir: Option<PathBuf>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
    /// Print sharpness statistics after the run.
    pub stats: Option<bool>,
    /// Directory receiving straightened JPEGs of selected photos.
    pub export_dir: Option<PathBuf>,
    /// JPEG quality for exports (1-100).
    pub jpeg_quality: Option<u8>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/photo-cull/config.toml`
    /// 2. Project-local: `.photo-cull.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as
    /// warnings and dropped, so the built-in default applies.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.discard_invalid() {
            warn!("{problem}");
        }

        config
    }

    /// Clears out-of-range values and describes each one.
    pub fn discard_invalid(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        check(
            &mut problems,
            &mut self.general.threads,
            |t| *t >= 1,
            "general.threads must be at least 1",
        );
        check(
            &mut problems,
            &mut self.selection.sharpness_threshold,
            |t| t.is_finite() && *t >= 0.0,
            "selection.sharpness_threshold must be non-negative",
        );
        check(
            &mut problems,
            &mut self.selection.brightness_min,
            |b| (0.0..=255.0).contains(b),
            "selection.brightness_min must be 0-255",
        );
        check(
            &mut problems,
            &mut self.selection.brightness_max,
            |b| (0.0..=255.0).contains(b),
            "selection.brightness_max must be 0-255",
        );
        if let (Some(min), Some(max)) = (self.selection.brightness_min, self.selection.brightness_max) {
            if min > max {
                problems.push(format!(
                    "selection.brightness_min ({min}) exceeds brightness_max ({max}), both ignored"
                ));
                self.selection.brightness_min = None;
                self.selection.brightness_max = None;
            }
        }
        check(
            &mut problems,
            &mut self.selection.center_factor,
            |f| *f > 0.0 && *f <= 1.0,
            "selection.center_factor must be in (0, 1]",
        );
        check(
            &mut problems,
            &mut self.tilt.max_angle,
            |a| *a > 0.0 && *a <= 45.0,
            "tilt.max_angle must be in (0, 45]",
        );
        check(
            &mut problems,
            &mut self.detector.min_confidence,
            |c| (0.0..=1.0).contains(c),
            "detector.min_confidence must be 0.0-1.0",
        );
        check(
            &mut problems,
            &mut self.detector.nms_threshold,
            |c| (0.0..=1.0).contains(c),
            "detector.nms_threshold must be 0.0-1.0",
        );
        check(
            &mut problems,
            &mut self.output.format,
            |f| f == "json" || f == "jsonl",
            "output.format must be 'json' or 'jsonl'",
        );
        check(
            &mut problems,
            &mut self.output.jpeg_quality,
            |q| (1..=100).contains(q),
            "output.jpeg_quality must be 1-100",
        );

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);
        self.general.threads = other.general.threads.or(self.general.threads);

        // Selection
        let (sel, theirs) = (&mut self.selection, other.selection);
        sel.sharpness_threshold = theirs.sharpness_threshold.or(sel.sharpness_threshold);
        sel.brightness_min = theirs.brightness_min.or(sel.brightness_min);
        sel.brightness_max = theirs.brightness_max.or(sel.brightness_max);
        sel.horizontal_only = theirs.horizontal_only.or(sel.horizontal_only);
        sel.require_subject = theirs.require_subject.or(sel.require_subject);
        sel.center_factor = theirs.center_factor.or(sel.center_factor);

        // Tilt
        self.tilt.enabled = other.tilt.enabled.or(self.tilt.enabled);
        self.tilt.vote_threshold = other.tilt.vote_threshold.or(self.tilt.vote_threshold);
        self.tilt.max_angle = other.tilt.max_angle.or(self.tilt.max_angle);

        // Detector
        self.detector.enabled = other.detector.enabled.or(self.detector.enabled);
        self.detector.min_confidence = other
            .detector
            .min_confidence
            .or(self.detector.min_confidence);
        self.detector.nms_threshold = other.detector.nms_threshold.or(self.detector.nms_threshold);

        // Sidecar
        self.sidecar.enabled = other.sidecar.enabled.or(self.sidecar.enabled);
        self.sidecar.template = other.sidecar.template.or_else(|| self.sidecar.template.take());
        self.sidecar.dir = other.sidecar.dir.or_else(|| self.sidecar.dir.take());

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
        self.output.stats = other.output.stats.or(self.output.stats);
        self.output.export_dir = other
            .output
            .export_dir
            .or_else(|| self.output.export_dir.take());
        self.output.jpeg_quality = other.output.jpeg_quality.or(self.output.jpeg_quality);
    }
}

/// Drops `value` and records `message` when it fails `valid`.
fn check<T: std::fmt::Debug>(
    problems: &mut Vec<String>,
    value: &mut Option<T>,
    valid: impl Fn(&T) -> bool,
    message: &str,
) {
    if let Some(v) = value.as_ref().filter(|v| !valid(v)) {
        problems.push(format!("{message}, got {v:?}"));
        *value = None;
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("photo-cull").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.photo-cull.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .find(|path| path.exists())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.selection.sharpness_threshold.is_none());
        assert!(config.tilt.enabled.is_none());
        assert!(config.detector.min_confidence.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.sidecar.enabled.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
recursive = true
threads = 4

[selection]
sharpness_threshold = 20.0
brightness_min = 40.0
brightness_max = 210.0
horizontal_only = true
require_subject = false
center_factor = 0.5

[tilt]
enabled = false
vote_threshold = 150
max_angle = 8.0

[detector]
enabled = true
min_confidence = 0.8
nms_threshold = 0.25

[sidecar]
enabled = true
template = 'preset.xmp'
dir = 'sidecars'

[models]
dir = '/opt/models'

[output]
format = 'json'
pretty = true
progress = false
stats = true
export_dir = 'jpegs'
jpeg_quality = 90
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.general.threads, Some(4));
        assert_eq!(config.selection.sharpness_threshold, Some(20.0));
        assert_eq!(config.selection.horizontal_only, Some(true));
        assert_eq!(config.selection.require_subject, Some(false));
        assert_eq!(config.tilt.enabled, Some(false));
        assert_eq!(config.tilt.vote_threshold, Some(150));
        assert_eq!(config.detector.min_confidence, Some(0.8));
        assert_eq!(config.sidecar.template, Some(PathBuf::from("preset.xmp")));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.jpeg_quality, Some(90));
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[selection]
sharpness_threshold = 15.0
brightness_min = 30.0

[tilt]
enabled = true
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[selection]
sharpness_threshold = 25.0

[tilt]
enabled = false

[sidecar]
dir = 'out'
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.selection.sharpness_threshold, Some(25.0));
        assert_eq!(base.selection.brightness_min, Some(30.0));
        assert_eq!(base.tilt.enabled, Some(false));
        assert_eq!(base.sidecar.dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[output]
format = 'json'
export_dir = 'jpegs'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.output.format, Some("json".to_string()));
        assert_eq!(base.output.export_dir, Some(PathBuf::from("jpegs")));
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[selection
sharpness_threshold = 0.5
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[selection]
sharpness_threshold = "sharp"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_discard_invalid_values() {
        let mut config: AppConfig = toml::from_str(
            r"
[general]
threads = 0

[selection]
sharpness_threshold = -1.0
brightness_max = 300.0

[detector]
min_confidence = 1.5

[output]
format = 'xml'
jpeg_quality = 0
",
        )
        .expect("parse config");

        let problems = config.discard_invalid();

        assert_eq!(problems.len(), 6, "{problems:?}");
        assert!(problems.iter().any(|p| p.contains("selection.sharpness_threshold")));
        assert!(problems.iter().any(|p| p.contains("output.format")));
        assert!(config.general.threads.is_none());
        assert!(config.selection.sharpness_threshold.is_none());
        assert!(config.selection.brightness_max.is_none());
        assert!(config.detector.min_confidence.is_none());
        assert!(config.output.format.is_none());
        assert!(config.output.jpeg_quality.is_none());
    }

    #[test]
    fn test_inverted_brightness_range_discarded() {
        let mut config = AppConfig::default();
        config.selection.brightness_min = Some(200.0);
        config.selection.brightness_max = Some(100.0);

        let problems = config.discard_invalid();

        assert_eq!(problems.len(), 1);
        assert!(config.selection.brightness_min.is_none());
        assert!(config.selection.brightness_max.is_none());
    }

    #[test]
    fn test_valid_config_has_no_problems() {
        let mut config: AppConfig = toml::from_str(
            r"
[selection]
sharpness_threshold = 15.0
brightness_min = 30.0
brightness_max = 220.0

[output]
format = 'jsonl'
",
        )
        .expect("parse valid config");

        assert!(config.discard_invalid().is_empty());
        assert_eq!(config.selection.brightness_max, Some(220.0));
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "").unwrap();

        let found = find_config_in_parents(&nested).unwrap();
        assert_eq!(found, dir.path().join(PROJECT_CONFIG_FILE));
    }
}
