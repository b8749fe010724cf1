//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod photo_source;
mod progress;
mod raw_decoder;
mod result_output;
mod sidecar_writer;
mod subject_detector;

pub use photo_source::PhotoSource;
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use raw_decoder::RawDecoder;
pub use result_output::ResultOutput;
pub use sidecar_writer::SidecarWriter;
pub use subject_detector::SubjectDetector;
