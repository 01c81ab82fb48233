// src/bin/rbactivate.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rbactivate::{
    cli::{
        args::{Cli, Commands},
        handlers,
    },
    core::version_manager::ManagerError,
    system::executor::ExecutionError,
};

/// The main entry point of the `rbactivate` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()).await {
        // A child command that ran but exited nonzero propagates its own
        // exit code, so `rbactivate run` composes like the wrapped command.
        let execution_error = e
            .downcast_ref::<ManagerError>()
            .and_then(|manager_error| match manager_error {
                ManagerError::Execution(execution) => Some(execution),
                _ => None,
            })
            .or_else(|| e.downcast_ref::<ExecutionError>());
        if let Some(ExecutionError::NonZeroExitStatus { code, stderr, .. }) = execution_error {
            eprint!("{stderr}");
            std::process::exit(code.unwrap_or(1));
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {cli:?}");

    let workspace_root = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Activate { pretty } => handlers::activate(&workspace_root, pretty).await,
        Commands::Run { command } => handlers::run(&workspace_root, &command).await,
        Commands::Wrap { command } => handlers::wrap(&workspace_root, &command).await,
        Commands::Paths { to_host, paths } => {
            handlers::paths(&workspace_root, to_host, &paths).await
        }
    }
}
