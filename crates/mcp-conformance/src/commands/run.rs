//! `run` subcommand: execute the catalogue against the tool server.
//!
//! Launches the server, hands it to [`crate::orchestrator::run`], then prints
//! the summary. The exit code is 0 only when nothing failed unexpectedly.

use std::io::{self, Write};
use std::path::Path;

use crate::catalogue::select;
use crate::cli::RunArgs;
use crate::client::McpClient;
use crate::orchestrator::{self, RunOutcome};
use crate::rpc::RpcSession;
use crate::transport::ProcessTransport;

/// Run the `run` subcommand.
///
/// With `--json` the per-case progress goes to stderr and stdout carries only
/// the JSON report.
///
/// # Errors
///
/// Returns an error if configuration or the catalogue cannot be loaded, or if
/// the report cannot be written. An `--only` name missing from the catalogue,
/// a server that fails to launch, or one that rejects the handshake is
/// reported and yields exit code 1.
pub async fn run(
    config_path: Option<&Path>,
    server: Option<&str>,
    args: RunArgs,
) -> anyhow::Result<u8> {
    let mut config = super::resolve_with_server(config_path, server)?;
    if let Some(timeout_secs) = args.timeout {
        config.request_timeout_secs = timeout_secs;
    }
    if let Some(catalogue) = args.catalogue {
        config.catalogue = Some(catalogue);
    }

    let mut progress: Box<dyn Write> = if args.json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let catalogue = match select(super::catalogue_for(&config)?, &args.only) {
        Ok(catalogue) => catalogue,
        Err(e) => {
            tracing::error!("{e}");
            writeln!(progress, "Invalid test selection: {e}")?;
            return Ok(1);
        }
    };

    let command = config.server_command();
    let transport = match ProcessTransport::start(&command) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("{e}");
            writeln!(progress, "Failed to launch tool server: {e}")?;
            return Ok(1);
        }
    };

    let session = RpcSession::new(transport, config.read_timeout());
    let mut client = McpClient::new(session, config.client_identity());
    let outcome = orchestrator::run(&mut client, &catalogue, &mut progress).await?;

    if let RunOutcome::Completed(ref report) = outcome {
        let mut out = io::stdout();
        if args.json {
            serde_json::to_writer_pretty(&mut out, &report.to_json())?;
            writeln!(out)?;
        } else {
            report.write_summary(&mut out)?;
        }
    }

    Ok(outcome.exit_code())
}
