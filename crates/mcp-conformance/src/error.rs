//! Error types for the conformance harness.
//!
//! Transport and exchange errors never escape a test case: the RPC session
//! folds them into synthetic JSON-RPC error envelopes (see
//! [`crate::rpc::RpcResponse::synthetic`]). Only launch and handshake failures
//! abort a run.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// JSON-RPC error code: child closed its output stream before replying.
pub const ERR_NO_RESPONSE: i64 = -32005;

/// JSON-RPC error code: no reply within the configured read timeout.
pub const ERR_TIMEOUT: i64 = -32006;

/// JSON-RPC error code: reply line was empty or not valid JSON.
pub const ERR_PARSE: i64 = -32700;

/// JSON-RPC error code: local I/O failure talking to the child.
pub const ERR_INTERNAL: i64 = -32603;

/// Errors raised by a [`crate::transport::LineTransport`].
#[derive(Error, Debug)]
pub enum TransportError {
    /// The tool-server binary could not be spawned
    #[error("failed to launch {program}: {source}")]
    Launch { program: String, source: io::Error },

    /// Pipe I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transport was already stopped
    #[error("transport is closed")]
    Closed,
}

/// Failure to obtain a well-formed reply for one request.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Child closed stdout (exited or crashed)
    #[error("No response")]
    NoResponse,

    #[error("Timed out after {}s waiting for response", .0.as_secs())]
    Timeout(Duration),

    #[error("Empty response line")]
    EmptyLine,

    #[error("Failed to parse response: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Response line is not valid UTF-8")]
    InvalidUtf8,

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl ExchangeError {
    /// JSON-RPC style code used in the synthetic error envelope.
    pub fn code(&self) -> i64 {
        match self {
            ExchangeError::NoResponse => ERR_NO_RESPONSE,
            ExchangeError::Timeout(_) => ERR_TIMEOUT,
            ExchangeError::EmptyLine
            | ExchangeError::Malformed(_)
            | ExchangeError::InvalidUtf8 => ERR_PARSE,
            ExchangeError::Transport(_) => ERR_INTERNAL,
        }
    }

    /// The reply line arrived but could not be decoded.
    pub fn is_parse_error(&self) -> bool {
        self.code() == ERR_PARSE
    }
}

/// The server refused the `initialize` request.
#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("initialize rejected: {0}")]
    Rejected(String),
}

/// Misuse of an [`crate::client::McpClient`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// A tool call was attempted before the handshake completed
    #[error("tool calls are not allowed before the handshake completes")]
    NotInitialized,
}

/// Errors loading a catalogue file.
#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("failed to read catalogue {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse catalogue {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("catalogue {path} contains no cases")]
    Empty { path: PathBuf },

    /// `--only` named tools the catalogue does not contain
    #[error("--only names tools not in the catalogue: {}", .0.join(", "))]
    UnknownTools(Vec<String>),
}
