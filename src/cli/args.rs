// src/cli/args.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rbactivate: discovers how to run a Ruby interpreter in a workspace (bare
/// local install or compose-managed container) and emits a normalized
/// description of that environment for booting dependent tools.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The workspace root. Defaults to the current directory.
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the configured environment and print the activation result as JSON.
    Activate {
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Run a command in the activated environment (inside the service when
    /// the compose variant is selected).
    Run {
        /// The command line to run.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Print the invocation a host process would spawn for the given
    /// command, as JSON.
    Wrap {
        /// The command to wrap.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Print the host<->container path mapping, or translate the given paths.
    Paths {
        /// Translate container paths back to host paths instead.
        #[arg(long)]
        to_host: bool,

        /// Paths to translate. With no paths, the mapping itself is printed.
        paths: Vec<String>,
    },
}
