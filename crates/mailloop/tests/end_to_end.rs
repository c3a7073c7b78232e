//! Round trips through scripted SMTP, IMAP and POP3 servers.
//!
//! What the SMTP mock receives is handed to the retrieval mock, so the
//! message read back is exactly the one the probe transmitted.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use mailloop::{
    AccountConfig, Error, Prober, Retrieval, ServerConfig, probe_message, retrieve_latest_imap,
    retrieve_latest_pop3, submit, verify,
};
use mailloop_mime::{OutgoingMessage, dot_unstuff};
use mailloop_smtp::{SessionState, SmtpConfig, SmtpSession};
use mailloop_wire::{Credentials, FramerConfig, Protocol, Security};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpListener;
use tokio_test::io::Builder;

/// Mock stream that returns predefined responses.
struct MockStream {
    responses: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.responses.position()).unwrap();
        let data = self.responses.get_ref();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let to_read = (data.len() - pos).min(buf.remaining());
        buf.put_slice(&data[pos..pos + to_read]);
        self.responses.set_position((pos + to_read) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

const SMTP_SERVER: &[u8] = b"220 smtp.example.com ESMTP ready\r\n\
250-smtp.example.com at your service\r\n\
250-8BITMIME\r\n\
250 AUTH LOGIN PLAIN\r\n\
235 2.7.0 Accepted\r\n\
250 2.1.0 OK\r\n\
250 2.1.5 OK\r\n\
354 Go ahead\r\n\
250 2.0.0 OK queued\r\n\
221 2.0.0 closing connection\r\n";

const ADDRESS: &str = "probe@example.com";

fn credentials() -> Credentials {
    Credentials::new(ADDRESS, "secret")
}

/// Submits `message` to the SMTP mock and returns the DATA payload it
/// received, still in transfer form.
async fn submit_to_mock(message: &OutgoingMessage) -> Vec<u8> {
    let (stream, sent) = MockStream::new(SMTP_SERVER);
    let mut session = SmtpSession::new(stream, SmtpConfig::new("probe.example.com"));
    submit(&mut session, Some(&credentials()), message)
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Done);

    let sent = sent.lock().unwrap().clone();
    let start = sent.windows(6).position(|w| w == b"DATA\r\n").unwrap() + 6;
    let end = sent.len() - b".\r\nQUIT\r\n".len();
    assert_eq!(&sent[end..], b".\r\nQUIT\r\n");
    sent[start..end].to_vec()
}

/// IMAP server holding `stored` as its only message.
fn imap_script(stored: &[u8]) -> Vec<u8> {
    let mut s = Vec::new();
    s.extend_from_slice(b"* OK [CAPABILITY IMAP4rev1] ready\r\n");
    s.extend_from_slice(b"A0000 OK authenticated\r\n");
    s.extend_from_slice(b"* 1 EXISTS\r\n");
    s.extend_from_slice(b"* 1 RECENT\r\n");
    s.extend_from_slice(b"A0001 OK [READ-WRITE] INBOX selected\r\n");
    s.extend_from_slice(format!("* 1 FETCH (UID 5 BODY[] {{{}}}\r\n", stored.len()).as_bytes());
    s.extend_from_slice(stored);
    s.extend_from_slice(b" FLAGS ())\r\n");
    s.extend_from_slice(b"A0002 OK Success\r\n");
    s.extend_from_slice(b"* 1 FETCH (FLAGS (\\Deleted))\r\n");
    s.extend_from_slice(b"A0003 OK Success\r\n");
    s.extend_from_slice(b"A0004 OK closed\r\n");
    s.extend_from_slice(b"* BYE logging out\r\n");
    s.extend_from_slice(b"A0005 OK done\r\n");
    s
}

#[tokio::test]
async fn test_imap_round_trip() {
    let message = probe_message(ADDRESS, "1700000000000");
    let transferred = submit_to_mock(&message).await;

    let stored = dot_unstuff(&transferred);
    let (stream, sent) = MockStream::new(&imap_script(&stored));
    let received = retrieve_latest_imap(stream, FramerConfig::default(), &credentials(), "INBOX")
        .await
        .unwrap();

    assert_eq!(received.subject, "Test email subject: 1700000000000");
    assert_eq!(received.body, "Test email text: 1700000000000");
    assert_eq!(received.sequence, Some(1));
    verify(&message, &received).unwrap();

    let sent = String::from_utf8(sent.lock().unwrap().clone()).unwrap();
    assert_eq!(
        sent,
        concat!(
            "A0000 LOGIN probe@example.com secret\r\n",
            "A0001 SELECT INBOX\r\n",
            "A0002 FETCH 1 (UID FLAGS RFC822.SIZE BODY.PEEK[])\r\n",
            "A0003 STORE 1 +FLAGS (\\Deleted)\r\n",
            "A0004 CLOSE\r\n",
            "A0005 LOGOUT\r\n",
        )
    );
}

#[tokio::test]
async fn test_dot_line_survives_round_trip() {
    let message = OutgoingMessage::new(ADDRESS, ADDRESS, "dots", "first line\n.\nlast line");
    let transferred = submit_to_mock(&message).await;
    assert!(transferred.windows(6).any(|w| w == b"\r\n..\r\n"));

    let stored = dot_unstuff(&transferred);
    let (stream, _sent) = MockStream::new(&imap_script(&stored));
    let received = retrieve_latest_imap(stream, FramerConfig::default(), &credentials(), "INBOX")
        .await
        .unwrap();

    assert_eq!(received.body, "first line\n.\nlast line");
    verify(&message, &received).unwrap();
}

#[tokio::test]
async fn test_pop3_round_trip() {
    let message = probe_message(ADDRESS, "1700000000001");
    let transferred = submit_to_mock(&message).await;

    let mut retr = b"+OK message follows\r\n".to_vec();
    retr.extend_from_slice(&transferred);
    retr.extend_from_slice(b".\r\n");

    let stream = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER probe@example.com\r\n")
        .read(b"+OK send PASS\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK welcome\r\n")
        .write(b"STAT\r\n")
        .read(b"+OK 2 4096\r\n")
        .write(b"RETR 2\r\n")
        .read(&retr)
        .write(b"DELE 2\r\n")
        .read(b"+OK marked\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK bye\r\n")
        .build();

    let received = retrieve_latest_pop3(stream, FramerConfig::default(), &credentials())
        .await
        .unwrap();
    assert_eq!(received.subject, "Test email subject: 1700000000001");
    assert_eq!(received.sequence, Some(2));
    verify(&message, &received).unwrap();
}

#[tokio::test]
async fn test_pop3_empty_maildrop() {
    let stream = Builder::new()
        .read(b"+OK ready\r\n")
        .write(b"USER probe@example.com\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK\r\n")
        .write(b"STAT\r\n")
        .read(b"+OK 0 0\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK bye\r\n")
        .build();

    let err = retrieve_latest_pop3(stream, FramerConfig::default(), &credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyMailbox));
}

#[tokio::test]
async fn test_imap_empty_mailbox_logs_out() {
    let script = b"* OK ready\r\n\
A0000 OK authenticated\r\n\
* 0 EXISTS\r\n\
A0001 OK [READ-WRITE] selected\r\n\
* BYE logging out\r\n\
A0002 OK done\r\n";
    let (stream, sent) = MockStream::new(script);

    let err = retrieve_latest_imap(stream, FramerConfig::default(), &credentials(), "INBOX")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyMailbox));

    let sent = String::from_utf8(sent.lock().unwrap().clone()).unwrap();
    assert!(sent.ends_with("A0002 LOGOUT\r\n"));
}

#[tokio::test]
async fn test_someone_elses_message_is_a_mismatch() {
    let message = probe_message(ADDRESS, "1700000000002");
    let stored = b"Subject: newsletter\r\n\r\nunrelated\r\n";
    let (stream, _sent) = MockStream::new(&imap_script(stored));

    let received = retrieve_latest_imap(stream, FramerConfig::default(), &credentials(), "INBOX")
        .await
        .unwrap();
    let err = verify(&message, &received).unwrap_err();
    assert!(matches!(
        err,
        Error::Mismatch { field: "subject", ref actual, .. } if actual == "newsletter"
    ));
}

#[tokio::test]
async fn test_rejected_login_is_reported() {
    let (stream, sent) = MockStream::new(
        b"* OK ready\r\nA0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n",
    );

    let err = retrieve_latest_imap(stream, FramerConfig::default(), &credentials(), "INBOX")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Imap(mailloop_imap::Error::Auth(_))));
    assert_eq!(
        sent.lock().unwrap().as_slice(),
        b"A0000 LOGIN probe@example.com secret\r\n"
    );
}

/// Serves `script` to the first client, then drains what it sends until
/// it disconnects.
async fn serve_once(script: Vec<u8>) -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&script).await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });
    (port, handle)
}

#[tokio::test]
async fn test_prober_run_over_tcp() {
    let id = "1700000000003";
    let stored = format!(
        "From: {ADDRESS}\r\nTo: {ADDRESS}\r\nSubject: Test email subject: {id}\r\n\r\nTest email text: {id}\r\n"
    );
    let (smtp_port, smtp) = serve_once(SMTP_SERVER.to_vec()).await;
    let (imap_port, imap) = serve_once(imap_script(stored.as_bytes())).await;

    let plain = |port| {
        ServerConfig::builder("127.0.0.1")
            .port(port)
            .security(Security::None)
    };
    let config = AccountConfig::new(
        plain(smtp_port).build(Protocol::Smtp),
        Retrieval::Imap(plain(imap_port).build(Protocol::Imap)),
    );

    let report = Prober::new(config).run(&credentials(), id).await.unwrap();
    assert_eq!(report.id, id);
    assert_eq!(report.subject, format!("Test email subject: {id}"));
    assert_eq!(report.sequence, Some(1));
    assert_eq!(report.protocol, Protocol::Imap);

    let submitted = String::from_utf8(smtp.await.unwrap()).unwrap();
    assert!(submitted.starts_with("EHLO localhost\r\n"));
    assert!(submitted.contains("\r\nDate: "));
    assert!(submitted.ends_with(".\r\nQUIT\r\n"));

    let retrieved = String::from_utf8(imap.await.unwrap()).unwrap();
    assert!(retrieved.ends_with("A0004 CLOSE\r\nA0005 LOGOUT\r\n"));
}
