//! Group audit command

use std::process::ExitCode;

use colored::Colorize;

use crate::audit::{AuditOptions, AuditSummary, audit};
use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat, ReportArgs, batch};
use crate::error::Result;
use crate::models::AuditDisplay;
use crate::output::Formattable;
use crate::output::json::format_json_with_summary;
use crate::output::report::{self, Report};

/// Default report prefix for audits
const AUDIT_REPORT_PREFIX: &str = "sast_audit";

/// Audit every organization of the group and write the audit report.
pub async fn run(
    opts: &GlobalOptions,
    group: Option<&str>,
    report_args: &ReportArgs,
) -> Result<ExitCode> {
    let ctx = CommandContext::new(opts)?;
    let group_id = ctx.config.require_group_id(group)?.to_string();

    let progress = batch::progress_bar(ctx.format, "Auditing");
    let options = AuditOptions {
        concurrency: ctx.concurrency,
        cancel: ctx.cancel.clone(),
        progress: progress.clone(),
    };

    let records = audit(ctx.api(), &group_id, &options).await;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    let records = records?;
    let summary = AuditSummary::from_records(&records);

    match ctx.format {
        OutputFormat::Json => {
            println!("{}", format_json_with_summary(&records, &summary)?);
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let rows: Vec<AuditDisplay> = records.iter().map(AuditDisplay::from).collect();
            rows.print(ctx.format)?;
        }
    }

    if !matches!(ctx.format, OutputFormat::Json) {
        eprintln!();
        eprintln!(
            "{} organizations: {} enabled, {} disabled, {} failed ({} SAST projects)",
            summary.total,
            summary.enabled.to_string().green(),
            summary.disabled.to_string().yellow(),
            summary.failed.to_string().red(),
            summary.projects
        );
    }

    let prefix = ctx.report_prefix(report_args.output.as_deref(), AUDIT_REPORT_PREFIX);
    let report = Report::new("audit", records)
        .group(group_id)
        .summary(&summary)?;
    let rendered = report::render(&report, ctx.report_selection(report_args.report), &prefix);
    batch::print_written(&rendered);

    if summary.failed > 0 || !rendered.failures.is_empty() {
        Ok(ExitCode::from(batch::EXIT_INCOMPLETE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
