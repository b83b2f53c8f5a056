//! `config` subcommand: show resolved configuration.
//!
//! Loads the full resolved configuration and prints it either as JSON
//! (`--json`) or as a human-readable key=value table.

use std::path::Path;

use crate::cli::ConfigArgs;

/// Run the `config` subcommand.
///
/// # Errors
///
/// Returns an error if config resolution fails (e.g., unreadable TOML file).
pub fn run(
    config_path: Option<&Path>,
    server: Option<&str>,
    args: ConfigArgs,
) -> anyhow::Result<u8> {
    let cfg = super::resolve_with_server(config_path, server)?;

    if args.json {
        let json = serde_json::to_string_pretty(&cfg)?;
        println!("{json}");
    } else {
        println!("mcp-conformance configuration:");
        println!("  server_bin           = {}", cfg.server_bin);
        if cfg.server_args.is_empty() {
            println!("  server_args          = (none)");
        } else {
            println!("  server_args          = {}", cfg.server_args.join(" "));
        }
        println!("  protocol_version     = {}", cfg.protocol_version);
        println!("  client_name          = {}", cfg.client_name);
        println!("  client_version       = {}", cfg.client_version);
        match cfg.request_timeout_secs {
            0 => println!("  request_timeout_secs = 0 (disabled)"),
            secs => println!("  request_timeout_secs = {secs}"),
        }
        println!(
            "  catalogue            = {}",
            cfg.catalogue
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<built-in>".to_string())
        );
    }

    Ok(0)
}
