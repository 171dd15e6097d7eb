//! Shared flow for the mutating bulk commands
//!
//! Resolve targets, preview or confirm, run the executor, print the results
//! and counts, optionally persist a report, and map the outcome to an exit
//! code.

use std::io::IsTerminal;
use std::process::ExitCode;

use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::cli::{BatchArgs, CommandContext, OutputFormat, ReportArgs};
use crate::error::{InputError, Result};
use crate::executor::{
    BatchOutcome, BatchPlan, ExecuteOptions, Operation, OperationResult, TargetStatus, execute,
};
use crate::input::{Target, TargetSet, TargetSource};
use crate::models::ResultDisplay;
use crate::output::Formattable;
use crate::output::json::format_json_with_summary;
use crate::output::report::{self, Report, RenderOutcome};

/// Exit code for a batch that stopped on Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Exit code for a batch with failed targets or an authentication abort
pub const EXIT_INCOMPLETE: u8 = 2;

/// Resolve organization targets, reporting rejected records on stderr.
pub fn resolve_targets(source: &TargetSource) -> Result<Vec<Target>> {
    let set = crate::input::resolve(source)?;
    accept(set, source)
}

/// Report rejected records and fail when nothing valid is left.
pub fn accept(set: TargetSet, source: &TargetSource) -> Result<Vec<Target>> {
    for error in &set.errors {
        eprintln!("{} Skipped {}", "⚠".yellow(), error);
    }
    if set.is_empty() {
        return Err(InputError::Empty(source.describe()).into());
    }
    info!(
        "Resolved {} target(s) from {} ({} rejected)",
        set.len(),
        source.describe(),
        set.errors.len()
    );
    Ok(set.targets)
}

/// Progress bar on stderr, or `None` for JSON output and non-terminals.
pub fn progress_bar(format: OutputFormat, message: &'static str) -> Option<ProgressBar> {
    if matches!(format, OutputFormat::Json) || !std::io::stderr().is_terminal() {
        return None;
    }
    let style = ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let bar = ProgressBar::new(0).with_style(style).with_message(message);
    Some(bar)
}

/// Ask before mutating; `--yes` answers for the user.
///
/// A prompt that cannot be shown (no terminal) counts as a refusal.
pub fn confirm_plan(yes: bool) -> impl FnOnce(&BatchPlan) -> bool {
    move |plan| {
        if yes {
            return true;
        }

        eprintln!();
        if plan.operation.is_delete() {
            eprintln!(
                "{} About to {}. This cannot be undone.",
                "⚠".yellow(),
                plan.describe()
            );
        } else {
            eprintln!("About to {}.", plan.describe());
        }
        if plan.settled > 0 {
            eprintln!("  {} target(s) need no change or were rejected", plan.settled);
        }
        eprintln!();

        match Confirm::new()
            .with_prompt("Proceed?")
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Confirmation prompt failed: {}", e);
                eprintln!("Cannot prompt for confirmation; pass --yes to proceed.");
                false
            }
        }
    }
}

/// Run one batch end to end.
pub async fn run(
    ctx: &CommandContext,
    targets: &[Target],
    operation: Operation,
    batch: BatchArgs,
    report_args: &ReportArgs,
) -> Result<ExitCode> {
    if batch.dry_run {
        eprintln!("{}", "DRY RUN - no changes will be made".yellow());
        eprintln!();
    }

    let progress = progress_bar(ctx.format, "Applying");
    let options = ExecuteOptions {
        dry_run: batch.dry_run,
        concurrency: ctx.concurrency,
        cancel: ctx.cancel.clone(),
        progress: progress.clone(),
    };

    let outcome = execute(
        ctx.api(),
        targets,
        operation,
        &options,
        confirm_plan(batch.yes),
    )
    .await;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    print_outcome(ctx.format, &outcome)?;

    if report_args.output.is_some() || report_args.report.is_some() {
        let prefix = ctx.report_prefix(report_args.output.as_deref(), operation.slug());
        let report = Report::new(operation.slug(), outcome.results.clone())
            .summary(&outcome.summary())?;
        let rendered = report::render(&report, ctx.report_selection(report_args.report), &prefix);
        print_written(&rendered);
    }

    Ok(ExitCode::from(exit_status(&outcome)))
}

/// Print per-target results and the summary counts.
pub fn print_outcome(format: OutputFormat, outcome: &BatchOutcome) -> Result<()> {
    let summary = outcome.summary();

    match format {
        OutputFormat::Json => {
            println!("{}", format_json_with_summary(&outcome.results, &summary)?);
            return Ok(());
        }
        OutputFormat::Table => {
            let rows: Vec<ResultDisplay> = outcome.results.iter().map(ResultDisplay::from).collect();
            rows.print(format)?;
        }
        OutputFormat::Pretty => {
            for result in &outcome.results {
                eprintln!("{}", pretty_line(result));
            }
        }
    }

    eprintln!();
    eprintln!(
        "{} succeeded, {} failed, {} skipped, {} not started",
        summary.success.to_string().green(),
        summary.failed.to_string().red(),
        summary.skipped.to_string().yellow(),
        summary.not_started
    );
    if outcome.aborted {
        eprintln!(
            "{} Stopped: authentication failed. Remaining targets were not attempted.",
            "✗".red()
        );
    } else if outcome.cancelled {
        eprintln!("{} Interrupted. Remaining targets were not attempted.", "⚠".yellow());
    }

    Ok(())
}

fn pretty_line(result: &OperationResult) -> String {
    let marker = match result.status {
        TargetStatus::Success => "✓".green(),
        TargetStatus::Failed => "✗".red(),
        TargetStatus::Skipped => "-".dimmed(),
        TargetStatus::Pending | TargetStatus::InProgress => "?".normal(),
    };
    if result.detail.is_empty() {
        format!("{} {}", marker, result.target)
    } else {
        format!("{} {}: {}", marker, result.target, result.detail.dimmed())
    }
}

/// List written report files and any format that failed.
pub fn print_written(rendered: &RenderOutcome) {
    for path in &rendered.written {
        eprintln!("{} Report written to {}", "✓".green(), path.display());
    }
    for failure in &rendered.failures {
        eprintln!(
            "{} Could not write {} report {}: {}",
            "✗".red(),
            failure.format,
            failure.path.display(),
            failure.message
        );
    }
}

/// Non-zero when anything failed or the batch stopped early.
pub fn exit_status(outcome: &BatchOutcome) -> u8 {
    if outcome.is_clean() {
        0
    } else if outcome.cancelled && !outcome.aborted {
        EXIT_INTERRUPTED
    } else {
        EXIT_INCOMPLETE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Identifier;

    fn org(id: &str) -> Target {
        Target::organization(Identifier::parse(id).unwrap(), None)
    }

    fn result(id: &str, status: TargetStatus) -> OperationResult {
        OperationResult {
            target: org(id),
            status,
            detail: String::new(),
        }
    }

    #[test]
    fn test_exit_status_clean() {
        let outcome = BatchOutcome {
            results: vec![
                result("org-1", TargetStatus::Success),
                result("org-2", TargetStatus::Skipped),
            ],
            ..BatchOutcome::default()
        };
        assert_eq!(exit_status(&outcome), 0);
    }

    #[test]
    fn test_exit_status_with_failure() {
        let outcome = BatchOutcome {
            results: vec![
                result("org-1", TargetStatus::Success),
                result("org-2", TargetStatus::Failed),
            ],
            ..BatchOutcome::default()
        };
        assert_eq!(exit_status(&outcome), EXIT_INCOMPLETE);
    }

    #[test]
    fn test_exit_status_interrupted_and_aborted() {
        let interrupted = BatchOutcome {
            not_started: 3,
            cancelled: true,
            ..BatchOutcome::default()
        };
        assert_eq!(exit_status(&interrupted), EXIT_INTERRUPTED);

        let aborted = BatchOutcome {
            not_started: 3,
            cancelled: true,
            aborted: true,
            ..BatchOutcome::default()
        };
        assert_eq!(exit_status(&aborted), EXIT_INCOMPLETE);
    }

    #[test]
    fn test_yes_confirms_without_prompt() {
        let plan = BatchPlan {
            operation: Operation::DeleteProjects,
            mutations: vec![org("org-1")],
            settled: 0,
        };
        assert!(confirm_plan(true)(&plan));
    }

    #[test]
    fn test_accept_rejects_empty_set() {
        let set = TargetSet::default();
        let result = accept(set, &TargetSource::Single("x".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_hidden_for_json() {
        assert!(progress_bar(OutputFormat::Json, "Applying").is_none());
    }
}
