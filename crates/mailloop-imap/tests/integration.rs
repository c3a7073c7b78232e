//! Integration tests for the IMAP session.
//!
//! A scripted mock stream plays the server side; everything the client
//! writes is captured for inspection.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use mailloop_imap::parser::FetchItem;
use mailloop_imap::{
    Error, Flag, ImapSession, Response, ResponseParser, SequenceSet, SessionState,
    UntaggedResponse,
};
use mailloop_wire::Credentials;
use proptest::prelude::*;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
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

const MESSAGE: &str = concat!(
    "From: probe@example.com\r\n",
    "To: probe@example.com\r\n",
    "Subject: Test email subject: 1700000000000\r\n",
    "\r\n",
    "Test email text: 1700000000000\r\n",
    ".\r\n",
);

fn script() -> Vec<u8> {
    let mut s = Vec::new();
    s.extend_from_slice(b"* OK [CAPABILITY IMAP4rev1 LITERAL+] Gimap ready\r\n");
    s.extend_from_slice(b"A0000 OK probe@example.com authenticated (Success)\r\n");
    s.extend_from_slice(b"* FLAGS (\\Answered \\Flagged \\Draft \\Deleted \\Seen)\r\n");
    s.extend_from_slice(b"* OK [UIDVALIDITY 1] UIDs valid.\r\n");
    s.extend_from_slice(b"* 3 EXISTS\r\n");
    s.extend_from_slice(b"* 0 RECENT\r\n");
    s.extend_from_slice(b"A0001 OK [READ-WRITE] INBOX selected. (Success)\r\n");
    s.extend_from_slice(
        format!(
            "* 3 FETCH (UID 17 FLAGS () RFC822.SIZE {len} BODY[] {{{len}}}\r\n",
            len = MESSAGE.len()
        )
        .as_bytes(),
    );
    s.extend_from_slice(MESSAGE.as_bytes());
    s.extend_from_slice(b")\r\n");
    s.extend_from_slice(b"A0002 OK Success\r\n");
    s.extend_from_slice(b"* 3 FETCH (FLAGS (\\Deleted))\r\n");
    s.extend_from_slice(b"A0003 OK Success\r\n");
    s.extend_from_slice(b"* 3 EXPUNGE\r\n");
    s.extend_from_slice(b"* 2 EXISTS\r\n");
    s.extend_from_slice(b"A0004 OK Success\r\n");
    s.extend_from_slice(b"* BYE LOGOUT Requested\r\n");
    s.extend_from_slice(b"A0005 OK 73 good day (Success)\r\n");
    s
}

#[tokio::test]
async fn test_retrieve_and_delete_latest() {
    let (stream, sent) = MockStream::new(&script());
    let mut session = ImapSession::from_stream(stream).await.unwrap();

    session
        .login(&Credentials::new("probe@example.com", "app password"))
        .await
        .unwrap();
    assert_eq!(session.select("INBOX").await.unwrap(), 3);

    let latest = session.fetch_latest().await.unwrap().unwrap();
    assert_eq!(latest.subject, "Test email subject: 1700000000000");
    assert_eq!(latest.body, "Test email text: 1700000000000\n.");
    assert_eq!(latest.sequence, Some(3));

    let set = SequenceSet::single(3).unwrap();
    let updated = session.store(&set, Flag::Deleted, true).await.unwrap();
    assert!(updated[0].1.is_deleted());

    let expunged = session.expunge().await.unwrap();
    assert_eq!(expunged.len(), 1);
    assert_eq!(session.mailbox().unwrap().exists, 2);
    assert_eq!(
        session.take_unsolicited(),
        vec![UntaggedResponse::Exists(2)]
    );

    session.logout().await.unwrap();
    assert_eq!(session.state(), SessionState::Logout);

    let sent = String::from_utf8(sent.lock().unwrap().clone()).unwrap();
    assert_eq!(
        sent,
        concat!(
            "A0000 LOGIN probe@example.com \"app password\"\r\n",
            "A0001 SELECT INBOX\r\n",
            "A0002 FETCH 3 (UID FLAGS RFC822.SIZE BODY.PEEK[])\r\n",
            "A0003 STORE 3 +FLAGS (\\Deleted)\r\n",
            "A0004 EXPUNGE\r\n",
            "A0005 LOGOUT\r\n",
        )
    );
}

#[tokio::test]
async fn test_closed_session_is_not_reused() {
    let (stream, sent) = MockStream::new(b"* OK ready\r\nA0000 OK bye\r\n");
    let mut session = ImapSession::from_stream(stream).await.unwrap();
    session.logout().await.unwrap();

    let err = session.select("INBOX").await.unwrap_err();
    assert!(matches!(err, Error::Protocol { ref text, .. } if text.contains("logout")));
    assert_eq!(sent.lock().unwrap().as_slice(), b"A0000 LOGOUT\r\n");
}

#[tokio::test]
async fn test_connection_lost_mid_response() {
    let (stream, _sent) = MockStream::new(b"* OK ready\r\n* 1 FETCH (BODY[] {50}\r\nshort");
    let mut session = ImapSession::from_stream(stream).await.unwrap();

    let err = session.noop().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(session.state(), SessionState::Logout);
}

#[test]
fn test_parser_fetch_literal_with_embedded_crlf() {
    let parsed = ResponseParser::parse(b"* 1 FETCH (BODY[] {11}\r\nHELLO\r\nWORL)\r\n").unwrap();

    match parsed {
        Response::Untagged(UntaggedResponse::Fetch { items, .. }) => {
            assert_eq!(
                items,
                vec![FetchItem::Body {
                    section: None,
                    origin: None,
                    data: Some(b"HELLO\r\nWORL".to_vec()),
                }]
            );
        }
        _ => panic!("Expected FETCH response"),
    }
}

proptest! {
    #[test]
    fn prop_literal_extracted_exactly(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut raw = format!("* 7 FETCH (BODY[] {{{}}}\r\n", data.len()).into_bytes();
        raw.extend_from_slice(&data);
        raw.extend_from_slice(b" UID 9)\r\n");

        let parsed = ResponseParser::parse(&raw).unwrap();
        let Response::Untagged(UntaggedResponse::Fetch { seq, items }) = parsed else {
            panic!("Expected FETCH response");
        };
        prop_assert_eq!(seq.get(), 7);
        prop_assert_eq!(items.len(), 2);
        prop_assert_eq!(
            &items[0],
            &FetchItem::Body { section: None, origin: None, data: Some(data.clone()) }
        );
    }
}
