//! JSON-RPC 2.0 session over a [`LineTransport`].
//!
//! [`RpcSession`] owns the transport and the request-id counter. It assumes a
//! single request in flight and a FIFO reply stream: every request is followed
//! by exactly one blocking read, and the line read is taken to be its reply.
//! Replies are not matched by id, with one exception: after a read times out,
//! one later line per abandoned request is discarded if it carries a lower
//! numeric id or cannot be decoded. A reply echoing the current id clears the
//! backlog.
//!
//! [`RpcSession::send_request`] never fails. A missing, empty, unparseable or
//! late reply is turned into a synthetic envelope carrying an `error` object
//! (see [`RpcResponse::synthetic`]) so classification degrades gracefully.

use std::io;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{ExchangeError, TransportError};
use crate::transport::LineTransport;

/// Protocol version literal placed in every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// A request envelope. `params` is omitted from the wire when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// A notification envelope: a request without an id, never answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }
}

/// One parsed reply line.
///
/// The raw envelope is kept as-is: the classifier cares about key presence
/// (`"error"` present with a `null` value still counts as an error), which a
/// typed struct with `Option` fields would lose.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    envelope: Value,
}

impl RpcResponse {
    /// Wrap a parsed reply envelope.
    pub fn from_value(envelope: Value) -> Self {
        Self { envelope }
    }

    /// Synthetic reply standing in for a failed exchange.
    pub fn synthetic(err: &ExchangeError) -> Self {
        Self::from_value(json!({
            "jsonrpc": JSONRPC_VERSION,
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            }
        }))
    }

    fn object(&self) -> Option<&Map<String, Value>> {
        self.envelope.as_object()
    }

    /// The `error` member, if the key is present.
    pub fn error(&self) -> Option<&Value> {
        self.object().and_then(|o| o.get("error"))
    }

    /// The `result` member, if the key is present.
    pub fn result(&self) -> Option<&Value> {
        self.object().and_then(|o| o.get("result"))
    }

    /// Numeric request id echoed by the server, if any.
    pub fn id(&self) -> Option<u64> {
        self.object()
            .and_then(|o| o.get("id"))
            .and_then(Value::as_u64)
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    /// The `error` member rendered as text: strings verbatim, anything else
    /// as compact JSON.
    pub fn error_text(&self) -> Option<String> {
        self.error().map(|err| match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn envelope(&self) -> &Value {
        &self.envelope
    }
}

/// Sequential JSON-RPC client session over one transport.
#[derive(Debug)]
pub struct RpcSession<T> {
    transport: T,
    next_id: u64,
    read_timeout: Option<Duration>,
    abandoned: usize,
}

impl<T: LineTransport> RpcSession<T> {
    /// Create a session. `read_timeout` of `None` waits indefinitely.
    pub fn new(transport: T, read_timeout: Option<Duration>) -> Self {
        Self {
            transport,
            next_id: 1,
            read_timeout,
            abandoned: 0,
        }
    }

    /// The id the next request will carry.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Send a request and wait for its reply.
    ///
    /// Consumes one id. Transport and parse failures come back as a synthetic
    /// error reply rather than an `Err`.
    pub async fn send_request(&mut self, method: &str, params: Option<Value>) -> RpcResponse {
        let id = self.next_id;
        self.next_id += 1;

        let request = RpcRequest::new(id, method, params);
        match self.exchange(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(id, method, "request failed: {e}");
                RpcResponse::synthetic(&e)
            }
        }
    }

    /// Send a notification. Does not consume an id and reads nothing back.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written to the transport.
    pub async fn send_notification(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), ExchangeError> {
        let notification = RpcNotification::new(method, params);
        let line = serialize(&notification)?;
        tracing::debug!(direction = "harness->server", %line);
        self.transport.write_line(&line).await?;
        Ok(())
    }

    /// Stop the underlying transport.
    pub async fn close(&mut self) {
        self.transport.stop().await;
    }

    async fn exchange(&mut self, request: &RpcRequest) -> Result<RpcResponse, ExchangeError> {
        let line = serialize(request)?;
        tracing::debug!(direction = "harness->server", %line);
        self.transport.write_line(&line).await?;

        loop {
            let reply = self.read_reply_line().await.and_then(|line| parse_reply(&line));
            match reply {
                Ok(response)
                    if self.abandoned > 0
                        && response.id().is_some_and(|rid| rid < request.id) =>
                {
                    self.abandoned -= 1;
                    tracing::warn!(
                        stale_id = ?response.id(),
                        current_id = request.id,
                        "discarding late reply to a timed-out request"
                    );
                }
                Ok(response) => {
                    if response.id() == Some(request.id) {
                        self.abandoned = 0;
                    }
                    return Ok(response);
                }
                Err(e) if self.abandoned > 0 && e.is_parse_error() => {
                    self.abandoned -= 1;
                    tracing::warn!(
                        current_id = request.id,
                        "discarding undecodable line while a timed-out reply is outstanding: {e}"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn read_reply_line(&mut self) -> Result<String, ExchangeError> {
        let read = match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.transport.read_line()).await {
                Ok(read) => read,
                Err(_) => {
                    self.abandoned += 1;
                    return Err(ExchangeError::Timeout(limit));
                }
            },
            None => self.transport.read_line().await,
        };
        let line = match read {
            Ok(Some(line)) => line,
            Ok(None) => return Err(ExchangeError::NoResponse),
            Err(TransportError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(ExchangeError::InvalidUtf8);
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(direction = "server->harness", %line);
        Ok(line)
    }
}

fn parse_reply(line: &str) -> Result<RpcResponse, ExchangeError> {
    if line.trim().is_empty() {
        return Err(ExchangeError::EmptyLine);
    }
    let value: Value = serde_json::from_str(line).map_err(ExchangeError::Malformed)?;
    Ok(RpcResponse::from_value(value))
}

fn serialize<S: Serialize>(message: &S) -> Result<String, ExchangeError> {
    serde_json::to_string(message).map_err(ExchangeError::Malformed)
}
