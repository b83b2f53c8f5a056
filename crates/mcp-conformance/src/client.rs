//! MCP client: handshake state machine and tool-call surface.
//!
//! [`McpClient`] wraps an [`RpcSession`] and refuses tool traffic until the
//! `initialize` / `notifications/initialized` exchange has completed.
//! The handshake is attempted once; a rejected handshake is fatal to the run.

use serde_json::{Value, json};

use crate::error::{ClientError, HandshakeError};
use crate::rpc::{RpcResponse, RpcSession};
use crate::transport::LineTransport;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const NOTIFICATION_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const METHOD_TOOLS_LIST: &str = "tools/list";

/// Identity and protocol version the harness presents during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub protocol_version: String,
    pub name: String,
    pub version: String,
}

impl ClientIdentity {
    /// Params of the `initialize` request.
    pub fn initialize_params(&self) -> Value {
        json!({
            "protocolVersion": self.protocol_version,
            "capabilities": {},
            "clientInfo": {
                "name": self.name,
                "version": self.version,
            }
        })
    }
}

/// Handshake progress. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Uninitialized,
    Ready,
}

#[derive(Debug)]
pub struct McpClient<T> {
    session: RpcSession<T>,
    identity: ClientIdentity,
    state: HandshakeState,
}

impl<T: LineTransport> McpClient<T> {
    pub fn new(session: RpcSession<T>, identity: ClientIdentity) -> Self {
        Self {
            session,
            identity,
            state: HandshakeState::Uninitialized,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Run the handshake: `initialize`, then the `notifications/initialized`
    /// notification. Calling it again once `Ready` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::Rejected`] if the `initialize` reply carries
    /// an `error` member (including synthetic errors for a dead or silent
    /// server).
    pub async fn initialize(&mut self) -> Result<(), HandshakeError> {
        if self.state == HandshakeState::Ready {
            return Ok(());
        }

        let params = self.identity.initialize_params();
        let response = self
            .session
            .send_request(METHOD_INITIALIZE, Some(params))
            .await;

        if let Some(message) = response.error_text() {
            tracing::error!(%message, "initialize rejected");
            return Err(HandshakeError::Rejected(message));
        }

        if let Some(server) = response.result().and_then(|r| r.get("serverInfo")) {
            tracing::info!(%server, "handshake accepted");
        }

        if let Err(e) = self
            .session
            .send_notification(NOTIFICATION_INITIALIZED, None)
            .await
        {
            tracing::warn!("failed to send {NOTIFICATION_INITIALIZED}: {e}");
        }

        self.state = HandshakeState::Ready;
        Ok(())
    }

    /// Invoke a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotInitialized`] before a successful handshake.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<RpcResponse, ClientError> {
        self.ensure_ready()?;
        let params = json!({"name": name, "arguments": arguments});
        Ok(self
            .session
            .send_request(METHOD_TOOLS_CALL, Some(params))
            .await)
    }

    /// Ask the server for its tool list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotInitialized`] before a successful handshake.
    pub async fn list_tools(&mut self) -> Result<RpcResponse, ClientError> {
        self.ensure_ready()?;
        Ok(self.session.send_request(METHOD_TOOLS_LIST, None).await)
    }

    /// Stop the tool server. Safe to call in any state, any number of times.
    pub async fn shutdown(&mut self) {
        self.session.close().await;
    }

    fn ensure_ready(&self) -> Result<(), ClientError> {
        match self.state {
            HandshakeState::Ready => Ok(()),
            HandshakeState::Uninitialized => Err(ClientError::NotInitialized),
        }
    }
}

/// Tool names advertised in a `tools/list` reply, in server order.
///
/// Returns `None` if the reply is an error or lacks a `tools` array.
pub fn advertised_tool_names(response: &RpcResponse) -> Option<Vec<String>> {
    if response.is_error() {
        return None;
    }
    let tools = response.result()?.get("tools")?.as_array()?;
    Some(
        tools
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
    )
}
