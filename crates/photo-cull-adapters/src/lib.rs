//! Photo Cull Adapters - External adapters for photo-cull.
//!
//! This crate provides adapters for:
//! - Filesystem photo discovery
//! - Raw and raster decoding
//! - Sidecar writing and straightened JPEG export
//! - Model downloading and caching

pub mod decoder;
pub mod export;
pub mod fs;
pub mod models;
pub mod sidecar;

pub use decoder::FileDecoder;
pub use export::JpegExporter;
pub use fs::FsPhotoSource;
pub use models::{model_path, models_dir, set_models_dir};
pub use sidecar::FsSidecarWriter;
