//! The individual steps of a round trip.
//!
//! Each step is generic over the transport so it runs the same against a
//! live server and a scripted mock.

use std::time::Duration;

use mailloop_imap::{Flag, ImapSession, SequenceSet, SessionState as ImapState};
use mailloop_mime::{FetchedMessage, OutgoingMessage};
use mailloop_pop3::Pop3Session;
use mailloop_smtp::{SessionState as SmtpState, SmtpSession};
use mailloop_wire::{Credentials, FramerConfig, Protocol};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Builds the probe message for `id`, addressed from and to `address`.
///
/// `id` must be unique per probe so the retrieved message can be matched
/// to the one sent; a millisecond timestamp is the usual choice.
#[must_use]
pub fn probe_message(address: &str, id: &str) -> OutgoingMessage {
    OutgoingMessage::new(
        address,
        address,
        format!("Test email subject: {id}"),
        format!("Test email text: {id}"),
    )
}

/// Submits `message` over an SMTP session and ends it with QUIT.
///
/// The greeting is exchanged first unless the caller already did so (for
/// example to upgrade with STARTTLS). Authentication is skipped when
/// `credentials` is `None`.
///
/// # Errors
///
/// Returns any SMTP failure; the session is unusable afterwards.
pub async fn submit<S>(
    session: &mut SmtpSession<S>,
    credentials: Option<&Credentials>,
    message: &OutgoingMessage,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if session.state() == SmtpState::Connected {
        session.greet().await?;
    }
    if let Some(credentials) = credentials {
        session.authenticate(credentials).await?;
    }

    session.begin_message(message.from()).await?;
    session.add_recipient(message.to()).await?;
    let reply = session.send(&mailloop_mime::encode(message)).await?;
    debug!(code = %reply.code, "message accepted");

    session.quit().await?;
    info!(subject = message.subject(), "probe submitted");
    Ok(())
}

/// Reads the newest message in `mailbox` over IMAP, then deletes it and
/// logs out.
///
/// The message is fetched with `BODY.PEEK[]`, flagged `\Deleted` and
/// removed by CLOSE.
///
/// # Errors
///
/// Returns [`Error::EmptyMailbox`] if the mailbox holds no messages, or any
/// IMAP failure.
pub async fn retrieve_latest_imap<S>(
    stream: S,
    framer: FramerConfig,
    credentials: &Credentials,
    mailbox: &str,
) -> Result<FetchedMessage>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = ImapSession::from_stream_with_config(stream, framer).await?;
    if session.state() == ImapState::NotAuthenticated {
        session.login(credentials).await?;
    }

    let exists = session.select(mailbox).await?;
    debug!(mailbox, exists, "mailbox selected");

    let Some(message) = session.fetch_latest().await? else {
        session.logout().await?;
        return Err(Error::EmptyMailbox);
    };

    let target = message
        .sequence
        .and_then(SequenceSet::single)
        .unwrap_or(SequenceSet::Last);
    session.store(&target, Flag::Deleted, true).await?;
    session.close().await?;
    session.logout().await?;

    info!(subject = %message.subject, "probe retrieved over IMAP");
    Ok(message)
}

/// Reads the newest message in the maildrop over POP3, then marks it
/// deleted and ends the session with QUIT so the deletion is committed.
///
/// # Errors
///
/// Returns [`Error::EmptyMailbox`] if the maildrop is empty, or any POP3
/// failure.
pub async fn retrieve_latest_pop3<S>(
    stream: S,
    framer: FramerConfig,
    credentials: &Credentials,
) -> Result<FetchedMessage>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = Pop3Session::from_stream_with_config(stream, framer).await?;
    session.login(credentials).await?;

    let count = session.list_messages().await?;
    if count == 0 {
        session.quit().await?;
        return Err(Error::EmptyMailbox);
    }

    let message = session.fetch_message(count).await?;
    session.mark_deleted(count).await?;
    session.quit().await?;

    info!(subject = %message.subject, "probe retrieved over POP3");
    Ok(message)
}

/// Checks that `received` carries the subject and body of `sent`.
///
/// Both sides are compared after trimming; line endings in the sent body
/// are normalised to `\n` as the decoder does.
///
/// # Errors
///
/// Returns [`Error::Mismatch`] naming the first field that differs.
pub fn verify(sent: &OutgoingMessage, received: &FetchedMessage) -> Result<()> {
    let expected = sent.subject().trim();
    let actual = received.subject.trim();
    if expected != actual {
        return Err(Error::Mismatch {
            field: "subject",
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    let expected = sent.body().replace("\r\n", "\n").replace('\r', "\n");
    let expected = expected.trim();
    let actual = received.body.trim();
    if expected != actual {
        return Err(Error::Mismatch {
            field: "body",
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Outcome of a successful round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripReport {
    /// Unique id carried in the subject and body.
    pub id: String,
    /// Subject that was sent and read back.
    pub subject: String,
    /// Sequence number the message had on the retrieval server.
    pub sequence: Option<u32>,
    /// Protocol used to read the message back.
    pub protocol: Protocol,
    /// Time from connecting for submission to the end of verification.
    pub elapsed: Duration,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn received(subject: &str, body: &str) -> FetchedMessage {
        FetchedMessage {
            subject: subject.to_string(),
            body: body.to_string(),
            sequence: Some(1),
        }
    }

    #[test]
    fn test_probe_message() {
        let message = probe_message("probe@example.com", "1700000000000");
        assert_eq!(message.from(), "probe@example.com");
        assert_eq!(message.to(), "probe@example.com");
        assert_eq!(message.subject(), "Test email subject: 1700000000000");
        assert_eq!(message.body(), "Test email text: 1700000000000");
    }

    #[test]
    fn test_verify_accepts_trimmed_match() {
        let sent = probe_message("a@example.com", "42");
        let back = received(" Test email subject: 42", "Test email text: 42\n\n");
        verify(&sent, &back).unwrap();
    }

    #[test]
    fn test_verify_normalises_line_endings() {
        let sent = OutgoingMessage::new("a@b.c", "a@b.c", "s", "one\r\n.\r\ntwo\r\n");
        verify(&sent, &received("s", "one\n.\ntwo")).unwrap();
    }

    #[test]
    fn test_verify_subject_mismatch() {
        let sent = probe_message("a@example.com", "42");
        let back = received("Test email subject: 41", "Test email text: 42");
        let err = verify(&sent, &back).unwrap_err();
        assert!(matches!(
            err,
            Error::Mismatch { field: "subject", ref actual, .. } if actual == "Test email subject: 41"
        ));
    }

    #[test]
    fn test_verify_body_mismatch() {
        let sent = probe_message("a@example.com", "42");
        let back = received("Test email subject: 42", "Test email text: 43");
        let err = verify(&sent, &back).unwrap_err();
        assert!(matches!(err, Error::Mismatch { field: "body", .. }));
    }
}
