//! CLI command definitions and handlers.

pub mod models;
pub mod select;
pub mod verify;

use clap::{Parser, Subcommand};

/// Photo Cull - Automated selection of sharp, well-exposed shots
#[derive(Parser)]
#[command(name = "photo-cull")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared select arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub select: select::SelectArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze photos and write sidecars for the keepers
    Select(select::SelectArgs),
    /// Check generated XMP sidecars
    Verify(verify::VerifyArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every photo was analyzed.
    Success = 0,
    /// At least one photo failed to analyze or verify.
    PartialFailure = 1,
    /// The run could not proceed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
