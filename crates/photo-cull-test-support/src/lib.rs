//! Test support utilities for photo-cull.
//!
//! Provides port mocks, synthetic photo builders, and helpers for writing
//! synthetic photos to disk.
//!
//! # Example
//!
//! ```
//! use photo_cull_test_support::{MockRawDecoder, MockSubjectDetector, SyntheticImageBuilder};
//!
//! let decoder = MockRawDecoder::new()
//!     .with_image("sharp.arw", SyntheticImageBuilder::checkerboard(160, 120))
//!     .with_image("soft.arw", SyntheticImageBuilder::uniform_gray(160, 120, 128));
//! let detector = MockSubjectDetector::centered(160, 120);
//! # let _ = (decoder, detector);
//! ```

mod builders;
mod mocks;

pub use builders::{write_png, SyntheticImageBuilder};
pub use mocks::{
    FailingDetector, MockPhotoSource, MockProgressSink, MockRawDecoder, MockResultOutput,
    MockSidecarWriter, MockSubjectDetector,
};
