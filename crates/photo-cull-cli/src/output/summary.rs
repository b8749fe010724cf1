//! Human-readable batch summary.

use std::fmt::Write;

use photo_cull_core::analysis::{Distribution, SharpnessStats};
use photo_cull_core::AnalysisResult;

/// Renders the end-of-run summary with sharpness statistics.
pub fn render(results: &[AnalysisResult], threshold: f64) -> String {
    let selected = results.iter().filter(|r| r.selected).count();
    let failed = results.iter().filter(|r| r.is_failed()).count();
    let stats = SharpnessStats::from_results(results);

    let mut out = String::new();
    let _ = writeln!(out, "Total photos: {}", results.len());
    let _ = writeln!(out, "Selected: {selected}");
    let _ = writeln!(out, "Rejected: {}", results.len() - selected - failed);
    let _ = writeln!(out, "Failed: {failed}");
    out.push('\n');
    out.push_str(&render_stats(&stats));
    let _ = writeln!(out, "  Current threshold: {threshold:.1}");
    out
}

fn render_stats(stats: &SharpnessStats) -> String {
    let mut out = String::from("Sharpness statistics:\n");

    if stats.is_empty() {
        out.push_str("  No photos with a measurable sharpness\n");
        return out;
    }

    if let Some(with) = &stats.with_subject {
        let d = &with.distribution;
        let _ = writeln!(out, "  Photos WITH faces ({} photos):", d.count);
        let _ = writeln!(out, "    Min: {:.1}", d.min);
        let _ = writeln!(out, "    25th percentile: {:.1}", d.p25);
        let _ = writeln!(out, "    Median (50th): {:.1}", d.median);
        let _ = writeln!(out, "    75th percentile: {:.1}", d.p75);
        let _ = writeln!(out, "    Max: {:.1}", d.max);
        let _ = writeln!(out, "    Average: {:.1}", d.mean);
        let s = &with.suggested;
        let _ = writeln!(out, "    Suggested threshold (conservative): {:.1}", s.conservative);
        let _ = writeln!(out, "    Suggested threshold (moderate): {:.1}", s.moderate);
        let _ = writeln!(out, "    Suggested threshold (strict): {:.1}", s.strict);
        out.push('\n');
    }

    if let Some(without) = &stats.without_subject {
        let d: &Distribution = &without.distribution;
        let _ = writeln!(out, "  Photos WITHOUT faces ({} photos):", d.count);
        let _ = writeln!(out, "    Min: {:.1}", d.min);
        let _ = writeln!(out, "    Max: {:.1}", d.max);
        let _ = writeln!(out, "    Average: {:.1}", d.mean);
        let _ = writeln!(out, "    Median: {:.1}", d.median);
        let _ = writeln!(
            out,
            "    Suggested threshold: {:.1} (70% of median)",
            without.suggested
        );
        out.push('\n');
    }

    out
}
