//! Result output port for emitting per-photo records.

use crate::domain::AnalysisResult;

/// Port for emitting analysis results.
///
/// Results arrive in input order. Streaming formats may write each record
/// immediately; document formats buffer until [`ResultOutput::finish`].
pub trait ResultOutput: Send + Sync {
    /// Records a single analysis result.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()>;

    /// Completes the output and flushes any buffered data.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or flushing fails.
    fn finish(&self) -> anyhow::Result<()>;
}
