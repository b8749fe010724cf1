//! Face detection inference using Candle.

mod blazeface;
mod detector;
mod runtime;

pub use blazeface::{BlazeFace, BlazeFaceConfig, FaceDetection, Letterbox, INPUT_SIZE};
pub use detector::BlazeFaceDetector;
pub use runtime::{load_weights, select_device, sigmoid};
