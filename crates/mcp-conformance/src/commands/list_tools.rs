//! `list-tools` subcommand: print the tools the server advertises.
//!
//! With `--check-catalogue`, also reports catalogue cases whose tool the
//! server does not advertise and exits 1 if there are any.

use std::path::Path;

use anyhow::Context;

use crate::cli::ListToolsArgs;
use crate::client::{McpClient, advertised_tool_names};
use crate::rpc::RpcSession;
use crate::transport::ProcessTransport;

/// Run the `list-tools` subcommand.
///
/// # Errors
///
/// Returns an error if the server cannot be launched, rejects the handshake,
/// or answers `tools/list` without a tool array.
pub async fn run(
    config_path: Option<&Path>,
    server: Option<&str>,
    args: ListToolsArgs,
) -> anyhow::Result<u8> {
    let mut config = super::resolve_with_server(config_path, server)?;
    if let Some(catalogue) = args.catalogue {
        config.catalogue = Some(catalogue);
    }

    let transport = ProcessTransport::start(&config.server_command())
        .with_context(|| format!("failed to launch {}", config.server_bin))?;
    let session = RpcSession::new(transport, config.read_timeout());
    let mut client = McpClient::new(session, config.client_identity());

    if let Err(e) = client.initialize().await {
        client.shutdown().await;
        return Err(e.into());
    }
    let response = client.list_tools().await;
    client.shutdown().await;
    let response = response?;

    let names = advertised_tool_names(&response).with_context(|| {
        format!(
            "tools/list returned no tool list: {}",
            response
                .error_text()
                .unwrap_or_else(|| response.envelope().to_string())
        )
    })?;

    for name in &names {
        println!("{name}");
    }
    println!();
    println!("{} tools advertised", names.len());

    if !args.check_catalogue {
        return Ok(0);
    }

    let catalogue = super::catalogue_for(&config)?;
    let missing: Vec<&str> = catalogue
        .iter()
        .map(|case| case.tool.as_str())
        .filter(|tool| !names.iter().any(|n| n == tool))
        .collect();

    if missing.is_empty() {
        println!("All {} catalogue tools are advertised", catalogue.len());
        Ok(0)
    } else {
        println!("Catalogue tools not advertised:");
        for tool in &missing {
            println!("  - {tool}");
        }
        Ok(1)
    }
}
