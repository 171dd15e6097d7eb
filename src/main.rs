//! sastop - audit and bulk-manage Snyk Code (SAST) across a Snyk group

use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, warn};

mod audit;
mod cli;
mod client;
mod config;
mod error;
mod executor;
mod input;
mod inventory;
mod models;
mod output;

use cli::args::GlobalOptions;
use cli::{Cli, Commands, ProjectsCommands};
use client::CancelToken;
use error::Result;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let cancel = CancelToken::new();
    spawn_interrupt_handler(cancel.clone());
    let opts = GlobalOptions::from_cli(&cli, cancel);

    match cli.command {
        Commands::Audit { group, report } => cli::audit::run(&opts, group.as_deref(), &report).await,
        Commands::Enable {
            target,
            batch,
            report,
        } => cli::toggle::run(&opts, &target, batch, &report, true).await,
        Commands::Disable {
            target,
            batch,
            report,
        } => cli::toggle::run(&opts, &target, batch, &report, false).await,
        Commands::Projects(projects_cmd) => match projects_cmd {
            ProjectsCommands::List { target } => cli::projects::list(&opts, &target).await,
            ProjectsCommands::Export { target, report } => {
                cli::projects::export(&opts, &target, &report).await
            }
            ProjectsCommands::Delete(args) => cli::projects::delete(&opts, &args).await,
        },
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `warn` by default, `debug` with `--debug`; `RUST_LOG` overrides both.
fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// First Ctrl-C stops new work and lets in-flight calls finish; a second one
/// exits immediately.
fn spawn_interrupt_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!();
        eprintln!("Interrupted; finishing in-flight requests (Ctrl-C again to quit now)...");
        warn!("Received Ctrl-C, cancelling batch");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}
