//! The harness run loop.
//!
//! [`run`] performs the handshake once, executes every catalogue case in order
//! through the same generic path, prints one status line per case, and always
//! shuts the tool server down before returning, including when the handshake
//! fails.

use std::io::{self, Write};

use serde_json::Value;

use crate::catalogue::TestCase;
use crate::classify::{Verdict, classify, truncate_message};
use crate::client::McpClient;
use crate::error::HandshakeError;
use crate::report::{RunReport, TestResult, write_case_line};
use crate::transport::LineTransport;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every case was executed.
    Completed(RunReport),
    /// The server rejected the handshake; no case was executed.
    HandshakeFailed(HandshakeError),
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed(report) => report.exit_code(),
            RunOutcome::HandshakeFailed(_) => 1,
        }
    }
}

/// Run `catalogue` against the server behind `client`, writing progress to
/// `out`. The client is shut down before this returns.
///
/// # Errors
///
/// Returns an I/O error only if writing to `out` fails. Tool and protocol
/// failures are recorded in the report.
pub async fn run<T, W>(
    client: &mut McpClient<T>,
    catalogue: &[TestCase],
    out: &mut W,
) -> io::Result<RunOutcome>
where
    T: LineTransport,
    W: Write,
{
    let outcome = drive(client, catalogue, out).await;
    client.shutdown().await;
    outcome
}

async fn drive<T, W>(
    client: &mut McpClient<T>,
    catalogue: &[TestCase],
    out: &mut W,
) -> io::Result<RunOutcome>
where
    T: LineTransport,
    W: Write,
{
    writeln!(out, "Initializing MCP connection...")?;
    if let Err(e) = client.initialize().await {
        writeln!(out, "Failed to initialize MCP connection: {e}")?;
        return Ok(RunOutcome::HandshakeFailed(e));
    }

    writeln!(out)?;
    writeln!(out, "Running {} tests...", catalogue.len())?;
    writeln!(out)?;

    let mut report = RunReport::new();
    for case in catalogue {
        let result = execute_case(client, case).await;
        let recorded = report.record(result, case.expect_api_error);
        write_case_line(out, recorded)?;
    }

    let tally = report.tally();
    tracing::info!(
        passed = tally.passed,
        failed = tally.unexpected_failed,
        expected_failures = tally.expected_failed,
        "run complete"
    );
    Ok(RunOutcome::Completed(report))
}

/// Invoke one case's tool and classify the reply.
pub async fn execute_case<T: LineTransport>(
    client: &mut McpClient<T>,
    case: &TestCase,
) -> TestResult {
    tracing::debug!(tool = %case.tool, expect_api_error = case.expect_api_error, "calling tool");
    let arguments = Value::Object(case.arguments.clone());
    let verdict = match client.call_tool(&case.tool, arguments).await {
        Ok(response) => classify(&response, case.expect_api_error),
        Err(e) => Verdict::Failure(truncate_message(&e.to_string())),
    };
    if let Verdict::ToleratedFailure(ref text) = verdict {
        tracing::info!(tool = %case.tool, %text, "tolerating upstream failure");
    }
    TestResult::from_verdict(&case.tool, verdict)
}
