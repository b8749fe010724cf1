//! Progress reporting port for UI integration.

use crate::domain::AnalysisResult;

/// Events emitted during a batch run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Analysis started for a photo.
    Started {
        /// Path to the photo.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total photos in batch, if known.
        total: Option<usize>,
    },
    /// Analysis completed for a photo, including failed ones.
    Completed {
        /// The analysis result.
        result: Box<AnalysisResult>,
    },
    /// All photos have been processed.
    Finished {
        /// Photos analyzed without error.
        processed: usize,
        /// Photos that failed to analyze.
        failed: usize,
        /// Photos selected.
        selected: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}
