//! Progress bar adapter using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use photo_cull_core::{AnalysisResult, ProgressEvent, ProgressSink};

/// Progress bar adapter for CLI output.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of items, if known
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-item status
    #[must_use]
    pub fn new(total: Option<u64>, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = if show_bar {
            let bar = total.map_or_else(IndicatifBar::new_spinner, IndicatifBar::new);

            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }

            Some(bar)
        } else {
            None
        };

        Self { bar, quiet }
    }
}

/// One-line verdict for a finished photo.
fn status_line(result: &AnalysisResult) -> String {
    if let Some(error) = &result.error {
        return format!("{}: failed: {error}", result.path);
    }
    if result.selected {
        return format!("{}: selected", result.path);
    }
    let reasons: Vec<&str> = result.reasons.iter().map(|r| r.as_str()).collect();
    format!("{}: rejected ({})", result.path, reasons.join(", "))
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started { path, total, .. } => {
                if let Some(bar) = &self.bar {
                    if let Some(t) = total {
                        bar.set_length(t as u64);
                    }
                    bar.set_message(path);
                }
            }
            ProgressEvent::Completed { result } => match &self.bar {
                Some(bar) => bar.inc(1),
                None => eprintln!("{}", status_line(&result)),
            },
            ProgressEvent::Finished {
                processed,
                failed,
                selected,
            } => {
                let summary =
                    format!("Done: {processed} analyzed, {selected} selected, {failed} failed");
                match &self.bar {
                    Some(bar) => bar.finish_with_message(summary),
                    None => eprintln!("{summary}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_cull_core::RejectionReason;

    #[test]
    fn test_status_line() {
        let failed = AnalysisResult::failed("a.cr2", "truncated file");
        assert_eq!(status_line(&failed), "a.cr2: failed: truncated file");

        let mut rejected = AnalysisResult::failed("b.cr2", "");
        rejected.error = None;
        rejected.reasons.insert(RejectionReason::NotSharp);
        rejected.reasons.insert(RejectionReason::NoSubject);
        assert_eq!(
            status_line(&rejected),
            "b.cr2: rejected (no subject, not sharp enough)"
        );

        rejected.reasons.clear();
        rejected.selected = true;
        assert_eq!(status_line(&rejected), "b.cr2: selected");
    }
}
