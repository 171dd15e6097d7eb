//! Target, batch and report arguments shared by the bulk commands

use std::path::PathBuf;

use clap::Args;

use crate::error::{InputError, Result};
use crate::input::TargetSource;
use crate::output::report::ReportSelection;

/// One organization on the command line, or a bulk file of them.
///
/// ```ignore
/// Enable {
///     #[command(flatten)]
///     target: TargetArgs,
/// }
/// ```
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// Organization ID
    #[arg(
        value_name = "ORG_ID",
        required_unless_present = "file",
        conflicts_with = "file"
    )]
    pub org: Option<String>,

    /// File listing organizations (text, JSON or CSV; chosen by extension)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl TargetArgs {
    /// Where the targets come from.
    pub fn source(&self) -> Result<TargetSource> {
        match (&self.org, &self.file) {
            (_, Some(path)) => Ok(TargetSource::File(path.clone())),
            (Some(org), None) => Ok(TargetSource::Single(org.clone())),
            (None, None) => Err(InputError::Empty("the command line".to_string()).into()),
        }
    }
}

/// Flags controlling a mutating batch
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct BatchArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show what would change without changing anything
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

/// Report destination and format
#[derive(Args, Debug, Default, Clone)]
pub struct ReportArgs {
    /// Report file prefix; a timestamp and extension are appended
    #[arg(long, short = 'o', value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Report format (json, tabular, both)
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub report: Option<ReportSelection>,
}
