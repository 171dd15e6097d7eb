//! SAST project commands: list, export, delete

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use log::debug;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, DeleteArgs, OutputFormat, ReportArgs, TargetArgs, batch};
use crate::error::{Error, InputError, Result};
use crate::executor::Operation;
use crate::input::{self, Target, TargetSet, TargetSource};
use crate::inventory::{self, ProjectInventory};
use crate::models::ProjectDisplay;
use crate::output::Formattable;
use crate::output::json::format_json_with_summary;
use crate::output::report::{self, Report};

/// Default report prefix for project exports
const EXPORT_REPORT_PREFIX: &str = "sast_projects";

/// List the SAST projects of the target organizations.
pub async fn list(opts: &GlobalOptions, target: &TargetArgs) -> Result<ExitCode> {
    let targets = batch::resolve_targets(&target.source()?)?;
    let ctx = CommandContext::new(opts)?;

    let inventory = fetch(&ctx, &targets).await?;

    match ctx.format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "projects": inventory.projects.len(),
                "failures": inventory.failures,
            });
            println!("{}", format_json_with_summary(&inventory.projects, &summary)?);
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let rows: Vec<ProjectDisplay> =
                inventory.projects.iter().map(ProjectDisplay::from).collect();
            rows.print(ctx.format)?;
            print_listing_failures(&inventory);
        }
    }

    Ok(listing_exit(&inventory))
}

/// Write the SAST projects of the target organizations to a report.
pub async fn export(
    opts: &GlobalOptions,
    target: &TargetArgs,
    report_args: &ReportArgs,
) -> Result<ExitCode> {
    let targets = batch::resolve_targets(&target.source()?)?;
    let ctx = CommandContext::new(opts)?;

    let inventory = fetch(&ctx, &targets).await?;
    print_listing_failures(&inventory);

    let prefix = ctx.report_prefix(report_args.output.as_deref(), EXPORT_REPORT_PREFIX);
    let written = write_inventory(&ctx, &inventory, report_args, &prefix)?;
    eprintln!("Exported {} SAST project(s)", inventory.projects.len());

    if !written || !inventory.is_complete() {
        Ok(ExitCode::from(batch::EXIT_INCOMPLETE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Delete SAST projects.
///
/// Three target shapes: explicit project ids of one organization, every
/// project of one organization, or every project of each organization in a
/// file.
pub async fn delete(opts: &GlobalOptions, args: &DeleteArgs) -> Result<ExitCode> {
    let (targets, operation) = delete_targets(args)?;
    let ctx = CommandContext::new(opts)?;

    if let Some(prefix) = &args.export_before {
        backup(&ctx, &targets, &args.report, prefix).await?;
    }

    batch::run(&ctx, &targets, operation, args.batch, &args.report).await
}

fn delete_targets(args: &DeleteArgs) -> Result<(Vec<Target>, Operation)> {
    if let Some(path) = &args.all_from {
        let targets = batch::resolve_targets(&TargetSource::File(path.clone()))?;
        return Ok((targets, Operation::DeleteOrgProjects));
    }

    let Some(org) = &args.org else {
        return Err(InputError::Empty("the command line".to_string()).into());
    };
    let org_id = input::parse_identifier(org)?;

    let targets = if let Some(path) = &args.file {
        let source = TargetSource::File(path.clone());
        batch::accept(input::resolve_projects(&org_id, &source)?, &source)?
    } else if !args.project_ids.is_empty() {
        let mut set = TargetSet::default();
        for project_id in &args.project_ids {
            let source = TargetSource::Single(project_id.clone());
            set.extend(input::resolve_projects(&org_id, &source)?);
        }
        batch::accept(set, &TargetSource::Single(args.project_ids.join(",")))?
    } else {
        vec![Target::organization(org_id, None)]
    };

    Ok((targets, Operation::DeleteProjects))
}

/// Export what is about to be deleted. Any failure stops the delete.
async fn backup(
    ctx: &CommandContext,
    targets: &[Target],
    report_args: &ReportArgs,
    prefix: &Path,
) -> Result<()> {
    let mut inventory = fetch(ctx, targets).await?;
    inventory.retain_targeted(targets);
    debug!("Backing up {} project(s) before delete", inventory.projects.len());

    if !inventory.is_complete() {
        print_listing_failures(&inventory);
        return Err(Error::Other(
            "Export before delete was incomplete; nothing was deleted".to_string(),
        ));
    }

    let prefix = ctx.report_prefix(Some(prefix), EXPORT_REPORT_PREFIX);
    if !write_inventory(ctx, &inventory, report_args, &prefix)? {
        return Err(Error::Other(
            "Export before delete could not be written; nothing was deleted".to_string(),
        ));
    }
    Ok(())
}

async fn fetch(ctx: &CommandContext, targets: &[Target]) -> Result<ProjectInventory> {
    let progress = batch::progress_bar(ctx.format, "Listing");
    let org_ids = inventory::organizations_of(targets);
    if let Some(bar) = &progress {
        bar.set_length(org_ids.len() as u64);
    }

    let inventory =
        inventory::collect_projects(ctx.api(), org_ids, ctx.concurrency, &ctx.cancel).await;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    inventory
}

/// Render the project report. Returns false when any format failed.
fn write_inventory(
    ctx: &CommandContext,
    inventory: &ProjectInventory,
    report_args: &ReportArgs,
    prefix: &Path,
) -> Result<bool> {
    let summary = serde_json::json!({
        "projects": inventory.projects.len(),
        "failures": inventory.failures,
    });
    let report = Report::new("projects", inventory.projects.clone()).summary(&summary)?;
    let rendered = report::render(&report, ctx.report_selection(report_args.report), prefix);
    batch::print_written(&rendered);
    Ok(rendered.failures.is_empty())
}

fn print_listing_failures(inventory: &ProjectInventory) {
    for failure in &inventory.failures {
        eprintln!(
            "{} Could not list projects of org {}: {}",
            "✗".red(),
            failure.org_id,
            failure.error
        );
    }
}

fn listing_exit(inventory: &ProjectInventory) -> ExitCode {
    if inventory.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(batch::EXIT_INCOMPLETE)
    }
}
