//! Line transport to the tool server under test.
//!
//! [`LineTransport`] is the seam between [`crate::rpc::RpcSession`] and the
//! bytes on the wire. [`ProcessTransport`] is the production implementation:
//! it owns the child process for the whole run and exchanges
//! newline-delimited JSON over its stdin/stdout. [`MockTransport`] is an
//! in-memory double with scripted replies, used by unit and integration tests.
//!
//! # Design notes
//!
//! The child's stderr is piped and drained by a background task that forwards
//! each line to `tracing` at debug level. The pipe would otherwise fill and
//! stall a chatty server mid-reply.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::framing::{LineReader, write_line};

/// Grace period in ms between the termination signal and a force-kill.
const SHUTDOWN_GRACE_MS: u64 = 500;

/// Line-oriented, strictly sequential connection to a tool server.
///
/// # Cancellation
///
/// [`LineTransport::read_line`] must be cancellation safe: the RPC session
/// races it against a timeout, and a read abandoned on timeout must not lose
/// data belonging to the next line.
#[async_trait]
pub trait LineTransport: Send {
    /// Write one line (a newline is appended) and flush immediately.
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Read the next line, or `None` once the server closed its output.
    async fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Terminate the server and release its resources. Idempotent.
    async fn stop(&mut self);
}

/// Program and arguments used to launch the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Transport backed by a spawned child process.
pub struct ProcessTransport {
    program: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<LineReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<()>>,
}

impl fmt::Debug for ProcessTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessTransport")
            .field("program", &self.program)
            .field("pid", &self.pid())
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl ProcessTransport {
    /// Spawn the tool server with piped stdin, stdout and stderr.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Launch`] if the binary is missing or not
    /// executable.
    pub fn start(command: &ServerCommand) -> Result<Self, TransportError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TransportError::Launch {
            program: command.program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(LineReader::new);
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(stderr)));

        tracing::info!(
            program = %command.program,
            pid = ?child.id(),
            "tool server started"
        );

        Ok(Self {
            program: command.program.clone(),
            child: Some(child),
            stdin,
            stdout,
            stderr_task,
        })
    }

    /// OS process id of the running server, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }
}

#[async_trait]
impl LineTransport for ProcessTransport {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::Closed)?;
        write_line(stdin, line).await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let stdout = self.stdout.as_mut().ok_or(TransportError::Closed)?;
        Ok(stdout.next_line().await?)
    }

    async fn stop(&mut self) {
        // Closing stdin lets a well-behaved server exit on EOF.
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return;
        };

        send_terminate(&child);

        match tokio::time::timeout(Duration::from_millis(SHUTDOWN_GRACE_MS), child.wait()).await {
            Ok(Ok(status)) => tracing::info!(%status, "tool server exited"),
            Ok(Err(e)) => tracing::warn!("error waiting for tool server: {e}"),
            Err(_) => {
                tracing::warn!(
                    grace_ms = SHUTDOWN_GRACE_MS,
                    "tool server ignored termination; killing"
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!("failed to kill tool server: {e}");
                }
            }
        }

        self.stdout = None;
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &Child) {
    if let Some(pid) = child.id() {
        // SAFETY: `kill` has no memory-safety preconditions. The pid belongs to
        // a child we have not yet reaped, so it cannot have been recycled.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &Child) {
    // No SIGTERM equivalent; the grace-period expiry falls through to kill().
    let _ = child;
}

async fn drain_stderr(stderr: ChildStderr) {
    let mut segments = BufReader::new(stderr).split(b'\n');
    while let Ok(Some(segment)) = segments.next_segment().await {
        let line = String::from_utf8_lossy(&segment);
        tracing::debug!(target: "tool_server", "{}", line.trim_end());
    }
}

// ─── In-memory transport ─────────────────────────────────────────────────────

/// One scripted read result for [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// A raw line, returned verbatim.
    Line(String),
    /// End of stream.
    Eof,
    /// Never completes; exercises read timeouts.
    Hang,
    /// A read failing with an I/O error of this kind.
    Fail(std::io::ErrorKind),
}

impl MockReply {
    pub fn json(value: Value) -> Self {
        MockReply::Line(value.to_string())
    }
}

/// In-memory [`LineTransport`] that returns scripted replies in order and
/// records every written line.
///
/// An exhausted script behaves like a closed stream.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: VecDeque<MockReply>,
    written: Arc<Mutex<Vec<String>>>,
    stops: Arc<AtomicUsize>,
    stopped: bool,
}

/// Observer side of a [`MockTransport`], kept by the test after the
/// transport itself has been moved into a session.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    written: Arc<Mutex<Vec<String>>>,
    stops: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Create a transport that will yield `replies` in order, plus a handle
    /// for inspecting what was written to it.
    pub fn new_with_handle(
        replies: impl IntoIterator<Item = MockReply>,
    ) -> (Self, MockTransportHandle) {
        let transport = Self {
            replies: replies.into_iter().collect(),
            ..Default::default()
        };
        let handle = MockTransportHandle {
            written: Arc::clone(&transport.written),
            stops: Arc::clone(&transport.stops),
        };
        (transport, handle)
    }
}

impl MockTransportHandle {
    /// Every line written so far, in order.
    pub fn written(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Written lines parsed as JSON; lines that fail to parse are skipped.
    pub fn written_json(&self) -> Vec<Value> {
        self.written()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Number of times `stop` was called.
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LineTransport for MockTransport {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        if self.stopped {
            return Err(TransportError::Closed);
        }
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if self.stopped {
            return Err(TransportError::Closed);
        }
        match self.replies.pop_front() {
            Some(MockReply::Line(line)) => Ok(Some(line)),
            Some(MockReply::Eof) | None => Ok(None),
            Some(MockReply::Hang) => std::future::pending().await,
            Some(MockReply::Fail(kind)) => Err(TransportError::Io(kind.into())),
        }
    }

    async fn stop(&mut self) {
        self.stopped = true;
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
