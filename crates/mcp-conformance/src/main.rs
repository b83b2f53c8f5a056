//! mcp-conformance: conformance harness for stdio JSON-RPC tool servers.
//!
//! # Subcommands
//!
//! - `run`: Run the test catalogue (default when no subcommand is given)
//! - `list-tools`: List advertised tools, optionally checking the catalogue
//! - `config`: Show resolved configuration

use std::process::ExitCode;

use clap::Parser;

use mcp_conformance::cli::{Cli, Commands, RunArgs};
use mcp_conformance::{commands, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init();
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let server = cli.server.as_deref();

    let code = match cli.command {
        None => commands::run::run(config, server, RunArgs::default()).await?,
        Some(Commands::Run(args)) => commands::run::run(config, server, args).await?,
        Some(Commands::ListTools(args)) => commands::list_tools::run(config, server, args).await?,
        Some(Commands::Config(args)) => commands::config_cmd::run(config, server, args)?,
    };
    Ok(ExitCode::from(code))
}
