//! Verify command - check generated XMP sidecars.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use photo_cull_core::sidecar::{verify, SidecarReport};
use tracing::info;

use super::ExitCode;

/// Arguments for the verify command
#[derive(Args)]
pub struct VerifyArgs {
    /// Sidecar files to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Run the verify command, printing one report per sidecar.
///
/// # Errors
///
/// Returns an error if a sidecar cannot be read.
pub fn run(args: &VerifyArgs) -> Result<ExitCode> {
    let mut failures = 0usize;

    for path in &args.paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = verify(&content);
        if !report.passed() {
            failures += 1;
        }
        print!("{}", format_report(&path.display().to_string(), &report));
    }

    info!("Verified {} sidecars, {failures} failed", args.paths.len());

    if failures > 0 {
        Ok(ExitCode::PartialFailure)
    } else {
        Ok(ExitCode::Success)
    }
}

fn format_report(name: &str, report: &SidecarReport) -> String {
    let mut out = String::new();
    let verdict = if report.passed() { "OK" } else { "FAILED" };
    let _ = writeln!(out, "{name}: {verdict}");

    for missing in &report.missing {
        let _ = writeln!(out, "  missing: {missing}");
    }

    let markers = [
        ("temperature", &report.markers.temperature),
        ("exposure", &report.markers.exposure),
        ("highlights", &report.markers.highlights),
    ];
    for (label, value) in markers {
        if let Some(value) = value {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }

    match &report.straighten_angle {
        Some(angle) => {
            let _ = writeln!(out, "  straighten: {angle}");
        }
        None => out.push_str("  straighten: none\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_cull_core::sidecar::{SidecarGenerator, BUILTIN_TEMPLATE};

    #[test]
    fn test_builtin_template_report() {
        let document = SidecarGenerator::default().generate(2.5);
        let text = format_report("a.xmp", &verify(&document.content));
        assert!(text.starts_with("a.xmp: OK\n"));
        assert!(text.contains("  straighten: 2.50\n"));
    }

    #[test]
    fn test_failed_report_lists_missing() {
        let text = format_report("b.xmp", &verify("<x:xmpmeta/>"));
        assert!(text.starts_with("b.xmp: FAILED\n"));
        assert!(text.contains("  missing: crs:AlreadyApplied\n"));
        assert!(text.contains("  straighten: none\n"));
    }

    #[test]
    fn test_untilted_template_has_no_angle() {
        let text = format_report("c.xmp", &verify(BUILTIN_TEMPLATE));
        assert!(text.contains("  straighten: none\n"));
    }
}
