//! Framed I/O for line-oriented mail protocols.
//!
//! SMTP, POP3 and IMAP all exchange CRLF-terminated lines. IMAP also embeds
//! byte-counted literals (`{n}` followed by exactly `n` raw bytes), so the
//! reader must be able to leave line mode for a fixed number of bytes and
//! come back.

#![allow(clippy::missing_errors_doc)]

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default maximum line length.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Default maximum literal size.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Limits and deadlines applied by a [`FramedStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    /// Longest accepted line, excluding the terminator.
    pub max_line_length: usize,
    /// Largest accepted literal.
    pub max_literal_size: usize,
    /// Deadline for each read. `None` waits forever.
    pub io_timeout: Option<Duration>,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
            max_literal_size: MAX_LITERAL_SIZE,
            io_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl FramerConfig {
    /// Sets the maximum line length.
    #[must_use]
    pub const fn max_line_length(mut self, limit: usize) -> Self {
        self.max_line_length = limit;
        self
    }

    /// Sets the maximum literal size.
    #[must_use]
    pub const fn max_literal_size(mut self, limit: usize) -> Self {
        self.max_literal_size = limit;
        self
    }

    /// Sets the per-read deadline.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }
}

/// Framed connection for line protocols.
///
/// Handles line-based reading with literal support and buffered writing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    config: FramerConfig,
}

impl<S> std::fmt::Debug for FramedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedStream")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream with default limits.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, FramerConfig::default())
    }

    /// Creates a new framed stream with the given limits.
    pub fn with_config(stream: S, config: FramerConfig) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            config,
        }
    }

    /// Returns the active limits.
    #[must_use]
    pub const fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Reads one line and returns it without its terminator.
    ///
    /// Lines end with CRLF; a bare LF is tolerated.
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let limit = self.config.io_timeout;
        with_deadline(limit, self.read_line_inner()).await
    }

    async fn read_line_inner(&mut self) -> Result<Vec<u8>> {
        let max = self.config.max_line_length;
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > max {
                return Err(Error::LineTooLong { limit: max });
            }
        }

        line.pop(); // LF
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        if line.len() > max {
            return Err(Error::LineTooLong { limit: max });
        }

        Ok(line)
    }

    /// Reads exactly `len` raw bytes.
    ///
    /// The bytes are not inspected, so CR and LF inside them are data.
    pub async fn read_literal(&mut self, len: usize) -> Result<Vec<u8>> {
        let max = self.config.max_literal_size;
        if len > max {
            return Err(Error::LiteralTooLarge {
                size: len,
                limit: max,
            });
        }

        let limit = self.config.io_timeout;
        let reader = &mut self.reader;
        with_deadline(limit, async move {
            let mut literal = vec![0u8; len];
            reader.read_exact(&mut literal).await?;
            Ok(literal)
        })
        .await
    }

    /// Writes `data` followed by CRLF and flushes.
    pub async fn write_line(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);
        self.write_buffer.extend_from_slice(b"\r\n");

        let limit = self.config.io_timeout;
        let stream = self.reader.get_mut();
        let buffer = &self.write_buffer;
        with_deadline(limit, async move {
            stream.write_all(buffer).await?;
            stream.flush().await?;
            Ok(())
        })
        .await
    }

    /// Writes raw data to the stream (message payloads, literals).
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let limit = self.config.io_timeout;
        let stream = self.reader.get_mut();
        with_deadline(limit, async move {
            stream.write_all(data).await?;
            stream.flush().await?;
            Ok(())
        })
        .await
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Note: Any buffered data will be lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

async fn with_deadline<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => fut.await,
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_simple_line() {
        let mock = Builder::new().read(b"+OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let line = framed.read_line().await.unwrap();
        assert_eq!(line, b"+OK ready");
    }

    #[tokio::test]
    async fn test_read_line_split_across_reads() {
        let mock = Builder::new()
            .read(b"250-smtp.example")
            .read(b".com\r")
            .read(b"\n250 OK\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"250-smtp.example.com");
        assert_eq!(framed.read_line().await.unwrap(), b"250 OK");
    }

    #[tokio::test]
    async fn test_read_line_bare_lf() {
        let mock = Builder::new().read(b"* OK hi\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* OK hi");
    }

    #[tokio::test]
    async fn test_read_literal_then_line() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {11}\r\n")
            .read(b"HELLO\r\nWORL")
            .read(b")\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* 1 FETCH (BODY[] {11}");
        assert_eq!(framed.read_literal(11).await.unwrap(), b"HELLO\r\nWORL");
        assert_eq!(framed.read_line().await.unwrap(), b")");
    }

    #[tokio::test]
    async fn test_write_line_appends_crlf() {
        let mock = Builder::new().write(b"USER alice\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_line(b"USER alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_write_raw_is_verbatim() {
        let mock = Builder::new().write(b"Subject: x\r\n\r\nbody\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_raw(b"Subject: x\r\n\r\nbody\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_is_transport_error() {
        let mock = Builder::new().read(b"+OK partial").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(200);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let config = FramerConfig::default().max_line_length(64);
        let mut framed = FramedStream::with_config(mock, config);

        let err = framed.read_line().await.unwrap_err();
        assert!(matches!(err, Error::LineTooLong { limit: 64 }));
        assert!(err.to_string().contains("line too long"));
        assert!(err.is_framing_violation());
    }

    #[tokio::test]
    async fn test_complete_line_over_limit_rejected() {
        let mock = Builder::new().read(b"0123456789\r\n").build();
        let config = FramerConfig::default().max_line_length(4);
        let mut framed = FramedStream::with_config(mock, config);

        assert!(matches!(
            framed.read_line().await,
            Err(Error::LineTooLong { limit: 4 })
        ));
    }

    #[tokio::test]
    async fn test_literal_size_validation() {
        let mock = Builder::new().build();
        let config = FramerConfig::default().max_literal_size(10);
        let mut framed = FramedStream::with_config(mock, config);

        let err = framed.read_literal(11).await.unwrap_err();
        assert!(matches!(
            err,
            Error::LiteralTooLarge {
                size: 11,
                limit: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_truncated_literal_is_transport_error() {
        let mock = Builder::new().read(b"HEL").build();
        let mut framed = FramedStream::new(mock);

        assert!(matches!(
            framed.read_literal(5).await,
            Err(Error::Transport(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let (client, _server) = tokio::io::duplex(64);
        let config = FramerConfig::default().io_timeout(Some(Duration::from_secs(5)));
        let mut framed = FramedStream::with_config(client, config);

        let err = framed.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[test]
    fn test_config_defaults() {
        let config = FramerConfig::default();
        assert_eq!(config.max_line_length, MAX_LINE_LENGTH);
        assert_eq!(config.max_literal_size, MAX_LITERAL_SIZE);
        assert_eq!(config.io_timeout, Some(Duration::from_secs(60)));
    }
}
