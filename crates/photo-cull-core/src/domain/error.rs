//! Typed analysis failures.

use thiserror::Error;

/// Failure while analyzing a single photo.
///
/// Never aborts a batch; the engine turns it into a terminal result record.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The source file could not be decoded.
    #[error("decode failed: {0:#}")]
    Decode(anyhow::Error),
    /// A subject is required but no detector is available.
    #[error("subject detector unavailable")]
    DetectorUnavailable,
    /// The detector was called and failed.
    #[error("subject detection failed: {0:#}")]
    Detection(anyhow::Error),
    /// Any other analysis failure.
    #[error("analysis failed: {0}")]
    Analysis(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_includes_context() {
        let err = AnalysisError::Decode(anyhow::anyhow!("bad header").context("reading a.cr2"));
        assert_eq!(err.to_string(), "decode failed: reading a.cr2: bad header");
    }

    #[test]
    fn test_detector_unavailable_message() {
        assert_eq!(
            AnalysisError::DetectorUnavailable.to_string(),
            "subject detector unavailable"
        );
    }
}
