//! Configuration types for mcp-conformance.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClientIdentity;
use crate::transport::ServerCommand;

/// Resolved harness configuration.
///
/// All fields have defaults, so an absent or partial config file still yields
/// a runnable configuration.
///
/// # Example `.mcp-conformance.toml`
///
/// ```toml
/// server_bin = "./target/debug/ethcli-mcp"
/// server_args = ["--quiet"]
/// request_timeout_secs = 30
/// catalogue = "conformance/catalogue.toml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Tool-server binary (default: `./target/release/ethcli-mcp`)
    #[serde(default = "default_server_bin")]
    pub server_bin: String,

    /// Extra arguments passed to the tool server
    #[serde(default)]
    pub server_args: Vec<String>,

    /// Protocol version offered in `initialize` (default: `2024-11-05`)
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// `clientInfo.name` sent in `initialize`
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// `clientInfo.version` sent in `initialize`
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Per-reply read timeout in seconds; `0` waits forever (default: `120`)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Catalogue file; `None` runs the built-in catalogue
    #[serde(default)]
    pub catalogue: Option<PathBuf>,
}

fn default_server_bin() -> String {
    "./target/release/ethcli-mcp".to_string()
}

fn default_protocol_version() -> String {
    "2024-11-05".to_string()
}

fn default_client_name() -> String {
    "ethcli-mcp-test".to_string()
}

fn default_client_version() -> String {
    "1.0.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_bin: default_server_bin(),
            server_args: Vec::new(),
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            request_timeout_secs: default_request_timeout_secs(),
            catalogue: None,
        }
    }
}

impl HarnessConfig {
    pub fn server_command(&self) -> ServerCommand {
        ServerCommand::new(self.server_bin.clone()).with_args(self.server_args.iter().cloned())
    }

    pub fn client_identity(&self) -> ClientIdentity {
        ClientIdentity {
            protocol_version: self.protocol_version.clone(),
            name: self.client_name.clone(),
            version: self.client_version.clone(),
        }
    }

    /// Read timeout, or `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
