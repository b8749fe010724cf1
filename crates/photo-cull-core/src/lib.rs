//! Photo Cull Core - Domain logic and analysis components
//!
//! This crate contains the core domain types, the capability ports, and the
//! per-photo analysis pipeline: sharpness scoring, tilt estimation, exposure
//! gating, the selection policy, and XMP sidecar generation with
//! rotation-compensated crop geometry.

pub mod analysis;
pub mod domain;
pub mod engine;
pub mod geometry;
pub mod inference;
pub mod ports;
pub mod sidecar;

pub use domain::{
    AnalysisError, AnalysisResult, Capabilities, Decision, ImageInfo, Region, RejectionReason,
    SelectionThresholds,
};
pub use engine::{Engine, EngineSettings};
pub use ports::{
    PhotoSource, ProgressEvent, ProgressSink, RawDecoder, ResultOutput, SidecarWriter,
    SubjectDetector,
};
pub use sidecar::{InjectionStrategy, SidecarDocument, SidecarGenerator};
