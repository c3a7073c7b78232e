//! POP3 retrieval session.

use std::fmt;
use std::fmt::Write as _;

use mailloop_mime::FetchedMessage;
use mailloop_wire::{Credentials, FramedStream, FramerConfig, Stage};
use md5::{Digest, Md5};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use super::{MaildropStat, SessionState};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{Status, apop_timestamp, parse_stat, parse_status};

/// A POP3 session over any byte stream.
///
/// Messages marked with [`Self::mark_deleted`] are removed only when
/// [`Self::quit`] completes. Dropping the session, or losing the
/// connection, before that leaves the maildrop untouched.
pub struct Pop3Session<S> {
    framed: FramedStream<S>,
    state: SessionState,
    greeting: String,
    timestamp: Option<String>,
}

impl<S> fmt::Debug for Pop3Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pop3Session")
            .field("state", &self.state)
            .field("greeting", &self.greeting)
            .finish_non_exhaustive()
    }
}

impl<S> Pop3Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting with default framing limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not `+OK`.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::from_stream_with_config(stream, FramerConfig::default()).await
    }

    /// Reads the server greeting using the given framing limits.
    ///
    /// An APOP timestamp in the greeting is kept for [`Self::apop`].
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not `+OK`.
    pub async fn from_stream_with_config(stream: S, config: FramerConfig) -> Result<Self> {
        let mut session = Self {
            framed: FramedStream::with_config(stream, config),
            state: SessionState::Authorization,
            greeting: String::new(),
            timestamp: None,
        };

        let greeting = session.read_ok(Stage::Greeting).await?;
        session.timestamp = apop_timestamp(&greeting).map(ToString::to_string);
        debug!(greeting = %greeting, apop = session.timestamp.is_some(), "POP3 greeting");
        session.greeting = greeting;
        Ok(session)
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the greeting text after `+OK`.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Returns the APOP timestamp from the greeting, if any.
    #[must_use]
    pub fn apop_timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.framed.get_ref()
    }

    /// Consumes the session, returning the underlying stream.
    ///
    /// Pending deletions are not committed.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }

    /// Logs in with `USER` and `PASS`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if either command is answered with `-ERR`.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.expect_state(Stage::Auth, SessionState::Authorization)?;
        let result = async {
            self.authenticate(&Command::User(credentials.username().to_string()))
                .await?;
            self.authenticate(&Command::Pass(credentials.secret().to_string()))
                .await
        }
        .await;
        self.finish(result, SessionState::Transaction)?;
        debug!(username = credentials.username(), "logged in");
        Ok(())
    }

    /// Logs in with `APOP`, proving knowledge of the secret without sending
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] without sending anything if the
    /// greeting carried no timestamp, or [`Error::Auth`] on `-ERR`.
    pub async fn apop(&mut self, credentials: &Credentials) -> Result<()> {
        self.expect_state(Stage::Auth, SessionState::Authorization)?;
        let Some(timestamp) = self.timestamp.as_deref() else {
            return Err(Error::NotSupported("APOP"));
        };

        let cmd = Command::Apop {
            user: credentials.username().to_string(),
            digest: apop_digest(timestamp, credentials.secret()),
        };
        let result = self.authenticate(&cmd).await;
        self.finish(result, SessionState::Transaction)
    }

    /// Returns the message count and maildrop size with `STAT`.
    ///
    /// # Errors
    ///
    /// Returns an error on `-ERR` or a malformed reply.
    pub async fn stat(&mut self) -> Result<MaildropStat> {
        self.expect_state(Stage::Command("STAT"), SessionState::Transaction)?;
        let result = async {
            let text = self.simple(&Command::Stat).await?;
            let (count, size) = parse_stat(&text)?;
            Ok(MaildropStat { count, size })
        }
        .await;
        self.finish(result, SessionState::Transaction)
    }

    /// Returns the number of messages in the maildrop.
    ///
    /// # Errors
    ///
    /// See [`Self::stat`].
    pub async fn list_messages(&mut self) -> Result<u32> {
        Ok(self.stat().await?.count)
    }

    /// Retrieves message `index` (1-based) with `RETR`.
    ///
    /// The bytes are returned in transfer form: CRLF line endings, leading
    /// dots still doubled, terminating `.` line removed. Pass them to
    /// `mailloop_mime::decode`.
    ///
    /// # Errors
    ///
    /// Returns an error on `-ERR` (for example, no such message).
    pub async fn fetch(&mut self, index: u32) -> Result<Vec<u8>> {
        let stage = Stage::Command("RETR");
        self.expect_state(stage, SessionState::Transaction)?;
        check_index(index, stage)?;

        let result = async {
            let text = self.simple(&Command::Retr(index)).await?;
            debug!(index, reply = %text, "retrieving message");
            self.read_multiline(stage).await
        }
        .await;
        self.finish(result, SessionState::Transaction)
    }

    /// Retrieves and decodes message `index`.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`]; also fails if the message cannot be decoded.
    pub async fn fetch_message(&mut self, index: u32) -> Result<FetchedMessage> {
        let raw = self.fetch(index).await?;
        Ok(mailloop_mime::decode(&raw)?.with_sequence(index))
    }

    /// Marks message `index` for deletion with `DELE`.
    ///
    /// Nothing is removed until [`Self::quit`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error on `-ERR`.
    pub async fn mark_deleted(&mut self, index: u32) -> Result<()> {
        let stage = Stage::Command("DELE");
        self.expect_state(stage, SessionState::Transaction)?;
        check_index(index, stage)?;
        let result = self.simple(&Command::Dele(index)).await.map(drop);
        self.finish(result, SessionState::Transaction)
    }

    /// Unmarks all deletions with `RSET`.
    ///
    /// # Errors
    ///
    /// Returns an error on `-ERR`.
    pub async fn reset(&mut self) -> Result<()> {
        self.expect_state(Stage::Command("RSET"), SessionState::Transaction)?;
        let result = self.simple(&Command::Rset).await.map(drop);
        self.finish(result, SessionState::Transaction)
    }

    /// Sends `NOOP`.
    ///
    /// # Errors
    ///
    /// Returns an error on `-ERR`.
    pub async fn noop(&mut self) -> Result<()> {
        self.expect_state(Stage::Command("NOOP"), SessionState::Transaction)?;
        let result = self.simple(&Command::Noop).await.map(drop);
        self.finish(result, SessionState::Transaction)
    }

    /// Ends the session with `QUIT`.
    ///
    /// From the transaction state this enters the update state, where the
    /// server removes every message marked deleted. A `-ERR` reply means
    /// the removal failed.
    ///
    /// # Errors
    ///
    /// Returns an error on `-ERR` or a lost connection. The session is
    /// closed either way.
    pub async fn quit(&mut self) -> Result<()> {
        let stage = Stage::Command("QUIT");
        if !matches!(
            self.state,
            SessionState::Authorization | SessionState::Transaction
        ) {
            return Err(self.state_error(stage));
        }

        if self.state == SessionState::Transaction {
            self.state = SessionState::Update;
        }
        let result = self.simple(&Command::Quit).await.map(drop);
        self.finish(result, SessionState::Closed)
    }

    fn expect_state(&self, stage: Stage, required: SessionState) -> Result<()> {
        if self.state == required {
            Ok(())
        } else {
            Err(self.state_error(stage))
        }
    }

    fn state_error(&self, stage: Stage) -> Error {
        Error::Protocol {
            stage,
            text: format!("not allowed in state {}", self.state),
        }
    }

    fn finish<T>(&mut self, result: Result<T>, next: SessionState) -> Result<T> {
        match &result {
            Ok(_) => self.state = next,
            Err(err) => {
                warn!(error = %err, state = %self.state, "POP3 session failed");
                self.state = SessionState::Closed;
            }
        }
        result
    }

    /// Sends an authorization command; `-ERR` becomes [`Error::Auth`].
    async fn authenticate(&mut self, cmd: &Command) -> Result<()> {
        match self.command(cmd).await? {
            Status::Ok(_) => Ok(()),
            Status::Err(text) => Err(Error::Auth(text)),
        }
    }

    /// Sends a command and returns the `+OK` text.
    async fn simple(&mut self, cmd: &Command) -> Result<String> {
        match self.command(cmd).await? {
            Status::Ok(text) => Ok(text),
            Status::Err(text) => Err(Error::Protocol {
                stage: Stage::Command(cmd.name()),
                text: format!("-ERR {text}"),
            }),
        }
    }

    async fn command(&mut self, cmd: &Command) -> Result<Status> {
        let stage = match cmd {
            Command::User(_) | Command::Pass(_) | Command::Apop { .. } => Stage::Auth,
            other => Stage::Command(other.name()),
        };
        debug!(command = %cmd.redacted(), "C:");
        self.framed
            .write_line(cmd.serialize().as_bytes())
            .await
            .map_err(|e| Error::from_wire(e, stage))?;
        let line = self.read_line(stage).await?;
        parse_status(&line)
    }

    async fn read_ok(&mut self, stage: Stage) -> Result<String> {
        let line = self.read_line(stage).await?;
        match parse_status(&line)? {
            Status::Ok(text) => Ok(text),
            Status::Err(text) => Err(Error::Protocol {
                stage,
                text: format!("-ERR {text}"),
            }),
        }
    }

    async fn read_line(&mut self, stage: Stage) -> Result<String> {
        let raw = self
            .framed
            .read_line()
            .await
            .map_err(|e| Error::from_wire(e, stage))?;
        let line = String::from_utf8_lossy(&raw).into_owned();
        trace!(%line, "S:");
        Ok(line)
    }

    /// Reads lines up to the lone `.` terminator, keeping them stuffed.
    async fn read_multiline(&mut self, stage: Stage) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let line = self
                .framed
                .read_line()
                .await
                .map_err(|e| Error::from_wire(e, stage))?;
            if line == b"." {
                break;
            }
            out.extend_from_slice(&line);
            out.extend_from_slice(b"\r\n");
        }
        trace!(bytes = out.len(), "multi-line response complete");
        Ok(out)
    }
}

fn check_index(index: u32, stage: Stage) -> Result<()> {
    if index == 0 {
        return Err(Error::Protocol {
            stage,
            text: "message numbers start at 1".to_string(),
        });
    }
    Ok(())
}

/// Lowercase hex MD5 of `timestamp` followed by `secret` (RFC 1939 §7).
#[must_use]
pub fn apop_digest(timestamp: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(32), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
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
    use std::time::Duration;
    use tokio_test::io::Builder;

    #[test]
    fn test_apop_digest_rfc1939_example() {
        assert_eq!(
            apop_digest("<1896.697170952@dbc.mtview.ca.us>", "tanstaaf"),
            "c4c9334bac560ecc979e58001b3e22fb"
        );
    }

    #[tokio::test]
    async fn test_greeting_keeps_timestamp() {
        let mock = Builder::new()
            .read(b"+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>\r\n")
            .build();
        let session = Pop3Session::from_stream(mock).await.unwrap();
        assert_eq!(session.state(), SessionState::Authorization);
        assert_eq!(
            session.apop_timestamp(),
            Some("<1896.697170952@dbc.mtview.ca.us>")
        );
    }

    #[tokio::test]
    async fn test_negative_greeting() {
        let mock = Builder::new().read(b"-ERR maildrop busy\r\n").build();
        let err = Pop3Session::from_stream(mock).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Greeting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_login_and_stat() {
        let mock = Builder::new()
            .read(b"+OK Gpop ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK send PASS\r\n")
            .write(b"PASS hunter2\r\n")
            .read(b"+OK Welcome.\r\n")
            .write(b"STAT\r\n")
            .read(b"+OK 2 320\r\n")
            .write(b"STAT\r\n")
            .read(b"+OK 2 320\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();

        session
            .login(&Credentials::new("alice", "hunter2"))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Transaction);
        assert_eq!(
            session.stat().await.unwrap(),
            MaildropStat { count: 2, size: 320 }
        );
        assert_eq!(session.list_messages().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_bad_password() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS wrong\r\n")
            .read(b"-ERR [AUTH] Username and password not accepted.\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();

        let err = session
            .login(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(ref text) if text.contains("not accepted")));
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.stat().await.is_err());
    }

    #[tokio::test]
    async fn test_apop_login() {
        let mock = Builder::new()
            .read(b"+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>\r\n")
            .write(b"APOP mrose c4c9334bac560ecc979e58001b3e22fb\r\n")
            .read(b"+OK mrose's maildrop has 2 messages (320 octets)\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();

        session
            .apop(&Credentials::new("mrose", "tanstaaf"))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Transaction);
    }

    #[tokio::test]
    async fn test_apop_without_timestamp() {
        let mock = Builder::new().read(b"+OK ready\r\n").build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();

        let err = session
            .apop(&Credentials::new("mrose", "tanstaaf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotSupported("APOP")));
        assert_eq!(session.state(), SessionState::Authorization);
    }

    #[tokio::test]
    async fn test_fetch_keeps_transfer_form() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER a\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS b\r\n")
            .read(b"+OK\r\n")
            .write(b"RETR 1\r\n")
            .read(b"+OK 58 octets\r\n")
            .read(b"Subject: Test email subject: 7\r\n\r\nfirst\r\n..\r\n")
            .read(b"..leading\r\n.\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();
        session.login(&Credentials::new("a", "b")).await.unwrap();

        let raw = session.fetch(1).await.unwrap();
        assert_eq!(
            raw,
            b"Subject: Test email subject: 7\r\n\r\nfirst\r\n..\r\n..leading\r\n"
        );

        let message = mailloop_mime::decode(&raw).unwrap();
        assert_eq!(message.subject, "Test email subject: 7");
        assert_eq!(message.body, "first\n.\n.leading");
    }

    #[tokio::test]
    async fn test_fetch_message_stamps_sequence() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER a\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS b\r\n")
            .read(b"+OK\r\n")
            .write(b"RETR 3\r\n")
            .read(b"+OK\r\nSubject: hi\r\n\r\nbody\r\n.\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();
        session.login(&Credentials::new("a", "b")).await.unwrap();

        let message = session.fetch_message(3).await.unwrap();
        assert_eq!(message.subject, "hi");
        assert_eq!(message.body, "body");
        assert_eq!(message.sequence, Some(3));
    }

    #[tokio::test]
    async fn test_fetch_before_login_sends_nothing() {
        let mock = Builder::new().read(b"+OK ready\r\n").build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();

        let err = session.fetch(1).await.unwrap_err();
        assert!(err.to_string().contains("not allowed in state authorization"));
        assert_eq!(session.state(), SessionState::Authorization);
    }

    #[tokio::test]
    async fn test_missing_message() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER a\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS b\r\n")
            .read(b"+OK\r\n")
            .write(b"RETR 9\r\n")
            .read(b"-ERR no such message\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();
        session.login(&Credentials::new("a", "b")).await.unwrap();

        let err = session.fetch(9).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Command("RETR"),
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_delete_reset_quit() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER a\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS b\r\n")
            .read(b"+OK\r\n")
            .write(b"DELE 1\r\n")
            .read(b"+OK message 1 deleted\r\n")
            .write(b"RSET\r\n")
            .read(b"+OK\r\n")
            .write(b"NOOP\r\n")
            .read(b"+OK\r\n")
            .write(b"DELE 1\r\n")
            .read(b"+OK message 1 deleted\r\n")
            .write(b"QUIT\r\n")
            .read(b"+OK bye\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();
        session.login(&Credentials::new("a", "b")).await.unwrap();

        session.mark_deleted(1).await.unwrap();
        session.reset().await.unwrap();
        session.noop().await.unwrap();
        session.mark_deleted(1).await.unwrap();
        session.quit().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.quit().await.is_err());
    }

    #[tokio::test]
    async fn test_index_zero_rejected() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER a\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS b\r\n")
            .read(b"+OK\r\n")
            .build();
        let mut session = Pop3Session::from_stream(mock).await.unwrap();
        session.login(&Credentials::new("a", "b")).await.unwrap();

        assert!(session.mark_deleted(0).await.is_err());
        assert_eq!(session.state(), SessionState::Transaction);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_retrieval_times_out() {
        let (client, mut server) = tokio::io::duplex(1024);
        tokio::io::AsyncWriteExt::write_all(&mut server, b"+OK ready\r\n")
            .await
            .unwrap();
        let config = FramerConfig::default().io_timeout(Some(Duration::from_secs(10)));
        let mut session = Pop3Session::from_stream_with_config(client, config)
            .await
            .unwrap();

        let err = session
            .login(&Credentials::new("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(session.state(), SessionState::Closed);
    }
}
