//! Output formatting for CLI.

mod json;
mod progress;
pub mod summary;

pub use json::JsonOutput;
pub use progress::ProgressBar;
