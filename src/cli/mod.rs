//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod audit;
pub mod batch;
pub mod completions;
pub mod context;
pub mod projects;
pub mod toggle;

pub use args::{BatchArgs, OutputFormat, ReportArgs, TargetArgs};
pub use context::CommandContext;

/// sastop - audit and bulk-manage Snyk Code (SAST) across a Snyk group
#[derive(Parser, Debug)]
#[command(name = "sastop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "SASTOP_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Snyk API token
    #[arg(long, global = true, env = "SNYK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Override config file location
    #[arg(long, global = true, env = "SASTOP_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the API host (scheme and host, e.g. https://api.eu.snyk.io)
    #[arg(long, global = true, env = "SASTOP_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Maximum number of concurrent API calls
    #[arg(long, global = true, env = "SASTOP_CONCURRENCY", hide_env = true)]
    pub concurrency: Option<usize>,

    /// Enable debug logging
    #[arg(long, global = true, env = "SASTOP_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit the SAST setting and project count of every organization in a group
    #[command(after_help = "EXAMPLES:\n  \
            sastop audit --group <GROUP_ID>                      # JSON report in the current directory\n  \
            sastop audit --group <GROUP_ID> --report both -o audits/weekly")]
    Audit {
        /// Group ID (defaults to group_id from the config file)
        #[arg(long, short = 'g')]
        group: Option<String>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Enable SAST for one organization or a file of organizations
    #[command(after_help = "EXAMPLES:\n  \
            sastop enable <ORG_ID>\n  \
            sastop enable --file orgs.csv --dry-run    # Preview only\n  \
            sastop enable --file audit.json --yes      # Re-use an audit report, no prompt")]
    Enable {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Disable SAST for one organization or a file of organizations
    #[command(after_help = "EXAMPLES:\n  \
            sastop disable <ORG_ID>\n  \
            sastop disable --file orgs.txt --dry-run")]
    Disable {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// List, export and delete SAST projects
    #[command(subcommand)]
    Projects(ProjectsCommands),

    /// Generate shell completions
    #[command(after_help = "\
  bash:   sastop completion bash > /etc/bash_completion.d/sastop
  zsh:    sastop completion zsh > \"${fpath[1]}/_sastop\"
  fish:   sastop completion fish > ~/.config/fish/completions/sastop.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// SAST project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectsCommands {
    /// List the SAST projects of one organization or a file of organizations
    List {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Write the SAST projects of one or more organizations to a report
    Export {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Permanently delete SAST projects
    #[command(after_help = "EXAMPLES:\n  \
            sastop projects delete <ORG_ID> <PROJECT_ID> <PROJECT_ID>\n  \
            sastop projects delete <ORG_ID> --file projects.csv\n  \
            sastop projects delete <ORG_ID> --dry-run             # Every SAST project of the org\n  \
            sastop projects delete --all-from orgs.txt --export-before backup/projects")]
    Delete(DeleteArgs),
}

/// Arguments for `projects delete`
#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Organization the projects belong to
    #[arg(
        value_name = "ORG_ID",
        required_unless_present = "all_from",
        conflicts_with = "all_from"
    )]
    pub org: Option<String>,

    /// Project IDs to delete; omit to delete every SAST project of the org
    #[arg(value_name = "PROJECT_ID", conflicts_with = "file")]
    pub project_ids: Vec<String>,

    /// File listing project IDs of ORG_ID
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Delete every SAST project of each organization listed in this file
    #[arg(long, value_name = "ORGS_FILE", conflicts_with = "file")]
    pub all_from: Option<PathBuf>,

    /// Export the affected projects to a report before deleting
    #[arg(long, value_name = "PREFIX")]
    pub export_before: Option<PathBuf>,

    #[command(flatten)]
    pub batch: BatchArgs,

    #[command(flatten)]
    pub report: ReportArgs,
}
