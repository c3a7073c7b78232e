//! Submission tests against a scripted server.
//!
//! The mock stream replays canned replies and records everything the
//! session writes.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailloop_mime::{OutgoingMessage, decode, encode};
use mailloop_smtp::{SessionState, SmtpConfig, SmtpSession};
use mailloop_wire::Credentials;

/// Mock stream that returns predefined replies.
struct MockStream {
    replies: Cursor<Vec<u8>>,
    sent: Vec<u8>,
}

impl MockStream {
    fn new(replies: &[u8]) -> Self {
        Self {
            replies: Cursor::new(replies.to_vec()),
            sent: Vec::new(),
        }
    }

    fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.replies.get_ref();
        let pos = usize::try_from(self.replies.position()).unwrap();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.replies.set_position((pos + to_read) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

const HAPPY_SERVER: &[u8] = b"220 smtp.example.com ESMTP\r\n\
250-smtp.example.com at your service\r\n\
250-SIZE 35882577\r\n\
250-8BITMIME\r\n\
250-AUTH LOGIN PLAIN XOAUTH2\r\n\
250 SMTPUTF8\r\n\
235 2.7.0 Accepted\r\n\
250 2.1.0 OK\r\n\
250 2.1.5 OK\r\n\
354 Go ahead\r\n\
250 2.0.0 OK 1700000000 queued\r\n\
221 2.0.0 closing connection\r\n";

#[tokio::test]
async fn test_submit_probe_message() {
    let message = OutgoingMessage::new(
        "user@example.com",
        "user@example.com",
        "Test email subject: 1700000000000",
        "Test email text: 1700000000000",
    );
    let payload = encode(&message);

    let mut session = SmtpSession::new(MockStream::new(HAPPY_SERVER), SmtpConfig::new("probe"));
    let info = session.greet().await.unwrap();
    assert_eq!(info.max_message_size(), Some(35_882_577));

    session
        .authenticate(&Credentials::new("user@example.com", "secret"))
        .await
        .unwrap();
    session.begin_message("user@example.com").await.unwrap();
    session.add_recipient("user@example.com").await.unwrap();
    session.send(&payload).await.unwrap();
    assert_eq!(session.state(), SessionState::Authenticated);
    session.quit().await.unwrap();

    let sent = session.into_inner().sent_text();
    let commands: Vec<&str> = sent.split("\r\n").collect();
    assert_eq!(commands[0], "EHLO probe");
    assert!(commands[1].starts_with("AUTH PLAIN "));
    assert_eq!(commands[2], "MAIL FROM:<user@example.com> BODY=8BITMIME");
    assert_eq!(commands[3], "RCPT TO:<user@example.com>");
    assert_eq!(commands[4], "DATA");
    assert!(sent.contains("\r\nSubject: Test email subject: 1700000000000\r\n"));
    assert!(sent.ends_with("\r\nTest email text: 1700000000000\r\n.\r\nQUIT\r\n"));
}

#[tokio::test]
async fn test_dot_line_is_stuffed_on_the_wire() {
    let message = OutgoingMessage::new("a@example.com", "b@example.com", "dots", "one\n.\ntwo");
    let payload = encode(&message);

    let mut session = SmtpSession::new(MockStream::new(HAPPY_SERVER), SmtpConfig::default());
    session.greet().await.unwrap();
    session
        .authenticate(&Credentials::new("a@example.com", "pw"))
        .await
        .unwrap();
    session.begin_message("a@example.com").await.unwrap();
    session.add_recipient("b@example.com").await.unwrap();
    session.send(&payload).await.unwrap();

    let sent = session.into_inner().sent;
    let data_start = sent.windows(6).position(|w| w == b"DATA\r\n").unwrap() + 6;
    let terminator = sent.len() - 3;
    assert_eq!(&sent[terminator..], b".\r\n");

    let transferred = &sent[data_start..terminator];
    assert!(transferred.windows(7).any(|w| w == b"\r\n..\r\nt"));
    assert!(!transferred.windows(5).any(|w| w == b"\r\n.\r\n"));

    // What the server stores decodes back to the original body.
    assert_eq!(decode(transferred).unwrap().body, "one\n.\ntwo");
}

#[tokio::test]
async fn test_rejected_message_ends_session() {
    let server = b"220 smtp.example.com ESMTP\r\n\
250 smtp.example.com\r\n\
250 OK\r\n\
250 OK\r\n\
354 Go ahead\r\n\
552 5.3.4 Message size exceeds fixed limit\r\n";

    let mut session = SmtpSession::new(MockStream::new(server), SmtpConfig::default());
    session.greet().await.unwrap();
    session.begin_message("a@example.com").await.unwrap();
    session.add_recipient("b@example.com").await.unwrap();

    let err = session.send(b"Subject: big\r\n\r\nx\r\n").await.unwrap_err();
    assert!(err.is_permanent());
    assert_eq!(err.reply_code().map(|c| c.as_u16()), Some(552));
    assert_eq!(session.state(), SessionState::Done);
    assert!(session.quit().await.is_err());
}
