//! Configuration resolution for mcp-conformance.
//!
//! The entry point is [`resolve_config`], which layers an optional TOML file
//! and `MCP_CONFORMANCE_*` environment variables over [`HarnessConfig`]
//! defaults. CLI flags are applied afterwards by the command modules.

mod resolve;
mod types;

pub use resolve::{DEFAULT_CONFIG_FILE, resolve_config};
pub use types::HarnessConfig;
