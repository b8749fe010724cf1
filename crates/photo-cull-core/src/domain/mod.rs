//! Core domain types for photo culling.

mod capabilities;
mod error;
mod image;
mod region;
mod result;
mod selection;

pub use capabilities::Capabilities;
pub use error::AnalysisError;
pub use image::{perceptual_luma, ImageInfo};
pub use region::Region;
pub use result::{iso_timestamp, AnalysisResult, NEUTRAL_BRIGHTNESS};
pub use selection::{Decision, RejectionReason, SelectionThresholds};
