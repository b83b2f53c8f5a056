//! CLI argument types for mcp-conformance.
//!
//! Defines the top-level [`Cli`] struct and all subcommand [`Args`] using
//! clap's derive macros. Each subcommand maps to a module in
//! [`crate::commands`]. With no subcommand the harness runs with defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Conformance harness for stdio JSON-RPC tool servers
#[derive(Parser, Debug)]
#[command(name = "mcp-conformance", version, about)]
pub struct Cli {
    /// Path to a TOML config file (default: ./.mcp-conformance.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Tool-server binary to test (overrides config/env)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the test catalogue against the tool server (default)
    Run(RunArgs),
    /// List the tools the server advertises
    ListTools(ListToolsArgs),
    /// Show resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the `run` subcommand
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Catalogue TOML file (default: built-in catalogue)
    #[arg(long)]
    pub catalogue: Option<PathBuf>,

    /// Run only the named tool; repeatable
    #[arg(long = "only", value_name = "TOOL")]
    pub only: Vec<String>,

    /// Per-reply timeout in seconds (0 waits forever)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list-tools` subcommand
#[derive(Args, Debug)]
pub struct ListToolsArgs {
    /// Report catalogue tools the server does not advertise
    #[arg(long)]
    pub check_catalogue: bool,

    /// Catalogue TOML file to check (default: built-in catalogue)
    #[arg(long)]
    pub catalogue: Option<PathBuf>,
}

/// Arguments for the `config` subcommand
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
