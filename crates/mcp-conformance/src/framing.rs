//! Newline-delimited JSON framing for the tool-server stdio channel.
//!
//! Every message in either direction is one JSON document terminated by `\n`.
//! [`LineReader`] yields raw lines without interpreting them, so callers can
//! tell an empty line apart from end of stream. [`write_line`] always flushes:
//! a request left sitting in a buffer would leave the child blocked on read
//! and the harness blocked waiting for its reply.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

/// Reads newline-terminated lines from an async reader.
///
/// [`LineReader::next_line`] is cancellation safe, so it can be raced against
/// a timeout without losing a partially received line.
pub struct LineReader<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Create a new line reader wrapping the given async reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Read the next line with its terminator stripped, returning `None` on EOF.
    ///
    /// Blank lines are returned as `Some("")`, not skipped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading fails or the line is not valid UTF-8.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|mut l| {
            if l.ends_with('\r') {
                l.pop();
            }
            l
        }))
    }
}

/// Write `line` followed by `\n` and flush.
///
/// The `line` string must not contain embedded newlines.
///
/// # Errors
///
/// Returns an I/O error if writing or flushing fails.
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
