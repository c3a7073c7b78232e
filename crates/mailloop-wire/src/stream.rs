//! Plaintext and TLS transports.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::{Error, Result, Security};

/// A connection to a mail server, encrypted or not.
pub enum MailStream {
    /// Plain TCP.
    Plain(TcpStream),
    /// TLS over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl std::fmt::Debug for MailStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_tls() {
            "MailStream::Tls"
        } else {
            "MailStream::Plain"
        })
    }
}

impl MailStream {
    /// Runs the TLS handshake on a plaintext connection, as STARTTLS and
    /// STLS require once the server has agreed.
    pub async fn upgrade_to_tls(self, host: &str) -> Result<Self> {
        let Self::Plain(tcp) = self else {
            return Err(Error::Transport(io::Error::new(
                io::ErrorKind::InvalidInput,
                "stream is already TLS",
            )));
        };
        let stream = handshake(tcp, host).await?;
        tracing::debug!(host, "upgraded connection to TLS");
        Ok(stream)
    }

    /// Whether traffic is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

/// Forwards a poll method to whichever stream is inside.
macro_rules! forward {
    ($this:expr, $method:ident($($arg:expr),*)) => {
        match $this.get_mut() {
            MailStream::Plain(stream) => Pin::new(stream).$method($($arg),*),
            MailStream::Tls(stream) => Pin::new(stream).$method($($arg),*),
        }
    };
}

impl AsyncRead for MailStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        forward!(self, poll_read(cx, buf))
    }
}

impl AsyncWrite for MailStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        forward!(self, poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        forward!(self, poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        forward!(self, poll_shutdown(cx))
    }
}

/// A TLS connector trusting the Mozilla root set from `webpki-roots`.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

async fn handshake(tcp: TcpStream, host: &str) -> Result<MailStream> {
    let server_name = ServerName::try_from(host.to_string())?;
    let tls = create_tls_connector().connect(server_name, tcp).await?;
    Ok(MailStream::Tls(Box::new(tls)))
}

/// Opens a TCP connection and immediately negotiates TLS.
pub async fn connect_tls(host: &str, port: u16) -> Result<MailStream> {
    let tcp = TcpStream::connect((host, port)).await?;
    handshake(tcp, host).await
}

/// Opens a TCP connection without TLS.
pub async fn connect_plain(host: &str, port: u16) -> Result<MailStream> {
    Ok(MailStream::Plain(TcpStream::connect((host, port)).await?))
}

/// Connects according to `security`, giving up after `timeout`.
///
/// [`Security::StartTls`] yields a plaintext stream; the protocol session
/// performs the upgrade once the server has agreed to it.
pub async fn connect(
    host: &str,
    port: u16,
    security: Security,
    timeout: Duration,
) -> Result<MailStream> {
    tracing::debug!(host, port, ?security, "connecting");
    let attempt = async {
        match security {
            Security::Implicit => connect_tls(host, port).await,
            Security::StartTls | Security::None => connect_plain(host, port).await,
        }
    };
    tokio::time::timeout(timeout, attempt)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_create_tls_connector() {
        let _connector = create_tls_connector();
    }

    #[tokio::test]
    async fn test_invalid_host_name_for_tls() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let tcp = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        let err = MailStream::Plain(tcp)
            .upgrade_to_tls("not a host name")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDnsName(_)));
    }

    #[tokio::test]
    async fn test_connect_plain_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::io::AsyncWriteExt::write_all(&mut socket, b"+OK\r\n")
                .await
                .unwrap();
        });

        let mut stream = connect("127.0.0.1", port, Security::None, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!stream.is_tls());

        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"+OK\r\n");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port, Security::None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
