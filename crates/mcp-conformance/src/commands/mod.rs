//! Command implementations for mcp-conformance subcommands.
//!
//! Each module corresponds to a top-level subcommand exposed by the CLI.
//! Every command returns the process exit code on success.

pub mod config_cmd;
pub mod list_tools;
pub mod run;

use std::path::Path;

use crate::catalogue::{TestCase, default_catalogue, load_catalogue};
use crate::config::{HarnessConfig, resolve_config};

/// Resolve configuration and apply the global `--server` override.
fn resolve_with_server(
    config_path: Option<&Path>,
    server: Option<&str>,
) -> anyhow::Result<HarnessConfig> {
    let mut config = resolve_config(config_path)?;
    if let Some(server) = server {
        config.server_bin = server.to_string();
    }
    Ok(config)
}

/// The configured catalogue file, or the built-in catalogue.
fn catalogue_for(config: &HarnessConfig) -> anyhow::Result<Vec<TestCase>> {
    match config.catalogue {
        Some(ref path) => Ok(load_catalogue(path)?),
        None => Ok(default_catalogue()),
    }
}
