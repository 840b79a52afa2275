// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sk - serverkeep CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;

use output::OutputFormat;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{daemon, server};
use sk_daemon::PathChanges;

#[derive(Parser)]
#[command(
    name = "sk",
    version,
    about = "serverkeep - keeps a game server running and restarts it on schedule"
)]
pub(crate) struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start the server (starts the daemon if needed)
    Start,
    /// Gracefully stop the server
    Stop,
    /// Restart the running server
    Restart,
    /// Show server state and the next scheduled restart
    Status,
    /// Show server output
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
        /// Keep printing new lines as they arrive
        #[arg(short, long)]
        follow: bool,
    },
    /// Back up the save files (server must be stopped)
    Backup,
    /// Update the server installation (server must be stopped)
    Update,
    /// Replace the daily restart times
    Schedule {
        /// Restart times, e.g. 06:00 18:30
        #[arg(required = true, value_name = "HH:MM")]
        times: Vec<String>,
    },
    /// Replace the server's command-line arguments (use `--` before them)
    Args {
        /// Arguments passed at the next launch
        #[arg(required = true, trailing_var_arg = true, value_name = "ARG")]
        args: Vec<String>,
    },
    /// Show or change the backup and update paths
    Paths {
        /// Directory holding the save files
        #[arg(long, value_name = "DIR")]
        save_dir: Option<PathBuf>,
        /// Directory backups are written to
        #[arg(long, value_name = "DIR")]
        backup_dir: Option<PathBuf>,
        /// Updater executable (steamcmd)
        #[arg(long, value_name = "PATH")]
        updater: Option<PathBuf>,
        /// Server installation updated by the updater
        #[arg(long, value_name = "DIR")]
        install_dir: Option<PathBuf>,
    },
    /// Start the server whenever the daemon starts
    Autostart {
        #[arg(value_enum)]
        state: server::Toggle,
    },
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" chain to avoid noisy duplicate output (common when
/// thiserror variants use `#[error("... {0}")]` with `#[from]`).
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Start => server::start(format).await,
        Commands::Stop => server::stop(format).await,
        Commands::Restart => server::restart(format).await,
        Commands::Status => server::status(format).await,
        Commands::Logs { limit, follow } => server::logs(limit, follow, format).await,
        Commands::Backup => server::backup(format).await,
        Commands::Update => server::update(format).await,
        Commands::Schedule { times } => server::schedule(times, format).await,
        Commands::Args { args } => server::args(args, format).await,
        Commands::Paths {
            save_dir,
            backup_dir,
            updater,
            install_dir,
        } => {
            let changes = PathChanges {
                save_dir,
                backup_dir,
                updater_executable: updater,
                install_dir,
            };
            server::paths(changes, format).await
        }
        Commands::Autostart { state } => server::autostart(state, format).await,
        Commands::Daemon(args) => daemon::daemon(args, format).await,
    }
}
