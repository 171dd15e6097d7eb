//! Enable / disable SAST in bulk

use std::process::ExitCode;

use log::debug;

use crate::cli::args::GlobalOptions;
use crate::cli::{BatchArgs, CommandContext, ReportArgs, TargetArgs, batch};
use crate::error::Result;
use crate::executor::Operation;

/// Set SAST to `enabled` for every target organization.
pub async fn run(
    opts: &GlobalOptions,
    target: &TargetArgs,
    batch_args: BatchArgs,
    report_args: &ReportArgs,
    enabled: bool,
) -> Result<ExitCode> {
    // Input problems surface before any credential or network check
    let targets = batch::resolve_targets(&target.source()?)?;
    let ctx = CommandContext::new(opts)?;

    let operation = Operation::Toggle { enabled };
    debug!("{} on {} organization(s)", operation, targets.len());

    batch::run(&ctx, &targets, operation, batch_args, report_args).await
}
