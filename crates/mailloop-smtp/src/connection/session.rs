//! SMTP submission session.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailloop_wire::{Credentials, FramedStream, MailStream, Stage};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use super::{ServerInfo, SessionState, SmtpConfig};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};

/// States in which a new mail transaction may begin.
const READY: &[SessionState] = &[SessionState::Greeted, SessionState::Authenticated];

/// An SMTP session over any byte stream.
///
/// Operations check the session state before touching the wire. A command
/// issued in the wrong state fails with [`Error::Protocol`] and sends
/// nothing. Any failure after that point leaves the session in
/// [`SessionState::Done`].
pub struct SmtpSession<S> {
    framed: FramedStream<S>,
    config: SmtpConfig,
    state: SessionState,
    authenticated: bool,
    server_info: ServerInfo,
}

impl<S> fmt::Debug for SmtpSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSession")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("server_info", &self.server_info)
            .finish_non_exhaustive()
    }
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an open connection. Nothing is read until [`Self::greet`].
    pub fn new(stream: S, config: SmtpConfig) -> Self {
        Self {
            framed: FramedStream::with_config(stream, config.framer),
            config,
            state: SessionState::Connected,
            authenticated: false,
            server_info: ServerInfo::default(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns what the server advertised.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.framed.get_ref()
    }

    /// Consumes the session and returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }

    /// Reads the 220 greeting and introduces the client.
    ///
    /// Sends EHLO and records the advertised extensions. A permanent
    /// rejection of EHLO falls back to HELO with no extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not 220 or neither EHLO nor HELO
    /// is accepted.
    pub async fn greet(&mut self) -> Result<&ServerInfo> {
        self.expect_state(Stage::Greeting, &[SessionState::Connected])?;
        let result = self.greet_inner().await;
        self.finish(result, SessionState::Greeted)?;
        Ok(&self.server_info)
    }

    async fn greet_inner(&mut self) -> Result<()> {
        let greeting = self.read_reply(Stage::Greeting).await?;
        let greeting = expect_code(greeting, Stage::Greeting, &[ReplyCode::SERVICE_READY])?;

        self.server_info.hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        self.hello().await
    }

    async fn hello(&mut self) -> Result<()> {
        let hostname = self.config.client_hostname.clone();
        let reply = self
            .command(&Command::Ehlo {
                hostname: hostname.clone(),
            })
            .await?;

        if reply.code == ReplyCode::OK {
            // First line is the greeting, the rest are extensions
            self.server_info.extensions = reply
                .message
                .iter()
                .skip(1)
                .map(|line| Extension::parse(line))
                .collect();
            return Ok(());
        }
        if !reply.code.is_permanent() {
            return Err(Error::unexpected(
                Stage::Command("EHLO"),
                reply.code,
                reply.message_text(),
            ));
        }

        debug!(code = %reply.code, "EHLO refused, falling back to HELO");
        let reply = self.command(&Command::Helo { hostname }).await?;
        expect_code(reply, Stage::Command("HELO"), &[ReplyCode::OK])?;
        self.server_info.extensions.clear();
        Ok(())
    }

    /// Authenticates with `AUTH PLAIN`, or `AUTH LOGIN` when the server
    /// offers LOGIN but not PLAIN.
    ///
    /// PLAIN is also used when the server advertises no mechanisms at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejects the credentials and
    /// [`Error::NotSupported`] if neither mechanism is offered.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        self.expect_state(Stage::Auth, &[SessionState::Greeted])?;

        let offered = self.server_info.auth_mechanisms();
        let mechanism = if offered.is_empty() || offered.contains(&AuthMechanism::Plain) {
            AuthMechanism::Plain
        } else if offered.contains(&AuthMechanism::Login) {
            AuthMechanism::Login
        } else {
            return Err(Error::NotSupported("AUTH PLAIN or AUTH LOGIN"));
        };

        let result = match mechanism {
            AuthMechanism::Login => self.auth_login(credentials).await,
            _ => self.auth_plain(credentials).await,
        };
        self.finish(result, SessionState::Authenticated)?;
        self.authenticated = true;
        debug!(username = credentials.username(), ?mechanism, "authenticated");
        Ok(())
    }

    async fn auth_plain(&mut self, credentials: &Credentials) -> Result<()> {
        let token = format!("\0{}\0{}", credentials.username(), credentials.secret());
        let reply = self
            .command(&Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(STANDARD.encode(token.as_bytes())),
            })
            .await?;
        auth_outcome(reply)
    }

    async fn auth_login(&mut self, credentials: &Credentials) -> Result<()> {
        let reply = self
            .command(&Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            })
            .await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return auth_outcome(reply);
        }

        let username = STANDARD.encode(credentials.username().as_bytes());
        let reply = self.command(&Command::AuthResponse(username)).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return auth_outcome(reply);
        }

        let secret = STANDARD.encode(credentials.secret().as_bytes());
        let reply = self.command(&Command::AuthResponse(secret)).await?;
        auth_outcome(reply)
    }

    /// Starts a transaction with `MAIL FROM:<from>`.
    ///
    /// `BODY=8BITMIME` is declared when the server supports it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] without sending anything if `from`
    /// is malformed, or an error if the server does not answer 250.
    pub async fn begin_message(&mut self, from: &str) -> Result<()> {
        self.expect_state(Stage::Command("MAIL FROM"), READY)?;
        let cmd = Command::MailFrom {
            from: Address::new(from)?,
            eight_bit: self.server_info.supports_8bitmime(),
        };
        let result = self.simple(&cmd, &[ReplyCode::OK]).await;
        self.finish(result, SessionState::MailStarted)
    }

    /// Adds a recipient with `RCPT TO:<to>`. May be repeated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] without sending anything if `to` is
    /// malformed, or an error if the server answers anything but 250/251.
    pub async fn add_recipient(&mut self, to: &str) -> Result<()> {
        self.expect_state(
            Stage::Command("RCPT TO"),
            &[SessionState::MailStarted, SessionState::RecipientAdded],
        )?;
        let cmd = Command::RcptTo {
            to: Address::new(to)?,
        };
        let result = self
            .simple(&cmd, &[ReplyCode::OK, ReplyCode::FORWARD])
            .await;
        self.finish(result, SessionState::RecipientAdded)
    }

    /// Sends the message with `DATA`.
    ///
    /// `data` must already be in transfer form (CRLF line endings,
    /// dot-stuffed), as produced by `mailloop_mime::encode`. It is written
    /// verbatim, followed by the terminating `.` line.
    ///
    /// On success the session is ready for another transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if DATA is not answered with 354 or the message is
    /// not accepted with 250.
    pub async fn send(&mut self, data: &[u8]) -> Result<Reply> {
        self.expect_state(Stage::Command("DATA"), &[SessionState::RecipientAdded])?;
        let result = self.send_inner(data).await;
        let ready = self.ready_state();
        self.finish(result, ready)
    }

    async fn send_inner(&mut self, data: &[u8]) -> Result<Reply> {
        let stage = Stage::Command("DATA");
        let reply = self.command(&Command::Data).await?;
        expect_code(reply, stage, &[ReplyCode::START_DATA])?;
        self.state = SessionState::DataSending;

        debug!(bytes = data.len(), "sending message data");
        self.write(data, stage).await?;
        if !data.is_empty() && !data.ends_with(b"\r\n") {
            self.write(b"\r\n", stage).await?;
        }
        self.write(b".\r\n", stage).await?;

        let reply = self.read_reply(stage).await?;
        expect_code(reply, stage, &[ReplyCode::OK])
    }

    /// Abandons the current transaction with `RSET`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer 250.
    pub async fn reset(&mut self) -> Result<()> {
        self.expect_state(
            Stage::Command("RSET"),
            &[
                SessionState::Greeted,
                SessionState::Authenticated,
                SessionState::MailStarted,
                SessionState::RecipientAdded,
            ],
        )?;
        let result = self.simple(&Command::Rset, &[ReplyCode::OK]).await;
        let ready = self.ready_state();
        self.finish(result, ready)
    }

    /// Sends `NOOP`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer 250.
    pub async fn noop(&mut self) -> Result<()> {
        self.expect_state(
            Stage::Command("NOOP"),
            &[
                SessionState::Greeted,
                SessionState::Authenticated,
                SessionState::MailStarted,
                SessionState::RecipientAdded,
            ],
        )?;
        let result = self.simple(&Command::Noop, &[ReplyCode::OK]).await;
        let current = self.state;
        self.finish(result, current)
    }

    /// Ends the session with `QUIT`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer with a 2xx reply. The
    /// session is done either way.
    pub async fn quit(&mut self) -> Result<()> {
        self.expect_state(
            Stage::Command("QUIT"),
            &[
                SessionState::Greeted,
                SessionState::Authenticated,
                SessionState::MailStarted,
                SessionState::RecipientAdded,
            ],
        )?;
        let result = async {
            let reply = self.command(&Command::Quit).await?;
            if reply.is_success() {
                Ok(())
            } else {
                Err(Error::unexpected(
                    Stage::Command("QUIT"),
                    reply.code,
                    reply.message_text(),
                ))
            }
        }
        .await;
        self.finish(result, SessionState::Done)
    }

    const fn ready_state(&self) -> SessionState {
        if self.authenticated {
            SessionState::Authenticated
        } else {
            SessionState::Greeted
        }
    }

    fn expect_state(&self, stage: Stage, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::Protocol {
                stage,
                code: None,
                text: format!("not allowed in state {}", self.state),
            })
        }
    }

    fn finish<T>(&mut self, result: Result<T>, next: SessionState) -> Result<T> {
        match &result {
            Ok(_) => self.state = next,
            Err(err) => {
                warn!(error = %err, state = %self.state, "SMTP session failed");
                self.state = SessionState::Done;
            }
        }
        result
    }

    async fn simple(&mut self, cmd: &Command, accepted: &[ReplyCode]) -> Result<()> {
        let reply = self.command(cmd).await?;
        expect_code(reply, stage_of(cmd), accepted).map(drop)
    }

    async fn command(&mut self, cmd: &Command) -> Result<Reply> {
        let stage = stage_of(cmd);
        debug!(command = %cmd.redacted(), "C:");
        self.write(&cmd.serialize(), stage).await?;
        self.read_reply(stage).await
    }

    async fn write(&mut self, data: &[u8], stage: Stage) -> Result<()> {
        self.framed
            .write_raw(data)
            .await
            .map_err(|e| Error::from_wire(e, stage))
    }

    async fn read_reply(&mut self, stage: Stage) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let raw = self
                .framed
                .read_line()
                .await
                .map_err(|e| Error::from_wire(e, stage))?;
            let line = String::from_utf8_lossy(&raw).into_owned();
            trace!(%line, "S:");
            if line.is_empty() {
                continue;
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);
            if is_last {
                break;
            }
        }

        parse_reply(&lines)
    }
}

impl SmtpSession<MailStream> {
    /// Upgrades a plaintext session to TLS with `STARTTLS`.
    ///
    /// The greeting must have been exchanged. EHLO is sent again over the
    /// encrypted channel, replacing the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if STARTTLS was not advertised,
    /// [`Error::Tls`] if the handshake fails, or a protocol error if the
    /// server refuses.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        self.expect_state(Stage::Tls, &[SessionState::Greeted])?;
        if self.framed.get_ref().is_tls() {
            return Err(Error::Protocol {
                stage: Stage::Tls,
                code: None,
                text: "connection is already encrypted".to_string(),
            });
        }
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS"));
        }

        let reply = self.command(&Command::StartTls).await?;
        expect_code(reply, Stage::Tls, &[ReplyCode::SERVICE_READY])?;

        let Self {
            framed,
            config,
            server_info,
            ..
        } = self;
        let stream = framed
            .into_inner()
            .upgrade_to_tls(host)
            .await
            .map_err(Error::Tls)?;

        let mut session = Self {
            framed: FramedStream::with_config(stream, config.framer),
            config,
            state: SessionState::Greeted,
            authenticated: false,
            server_info: ServerInfo {
                hostname: server_info.hostname,
                ..ServerInfo::default()
            },
        };
        session.hello().await?;
        debug!(host, "STARTTLS complete");
        Ok(session)
    }
}

const fn stage_of(cmd: &Command) -> Stage {
    match cmd {
        Command::Auth { .. } | Command::AuthResponse(_) => Stage::Auth,
        Command::StartTls => Stage::Tls,
        other => Stage::Command(other.name()),
    }
}

fn expect_code(reply: Reply, stage: Stage, accepted: &[ReplyCode]) -> Result<Reply> {
    if accepted.contains(&reply.code) {
        Ok(reply)
    } else {
        Err(Error::unexpected(stage, reply.code, reply.message_text()))
    }
}

fn auth_outcome(reply: Reply) -> Result<()> {
    if reply.code == ReplyCode::AUTH_SUCCESS {
        Ok(())
    } else if reply.code.is_negative() {
        Err(Error::Auth {
            code: reply.code,
            text: reply.message_text(),
        })
    } else {
        Err(Error::unexpected(
            Stage::Auth,
            reply.code,
            reply.message_text(),
        ))
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
    use std::time::Duration;
    use tokio_test::io::Builder;

    const EHLO_REPLY: &[u8] = b"250-smtp.example.com\r\n250-STARTTLS\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n";

    fn config() -> SmtpConfig {
        SmtpConfig::new("client.test")
    }

    #[tokio::test]
    async fn test_greet_records_extensions() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP ready\r\n")
            .write(b"EHLO client.test\r\n")
            .read(EHLO_REPLY)
            .build();
        let mut session = SmtpSession::new(mock, config());

        let info = session.greet().await.unwrap();
        assert_eq!(info.hostname, "smtp.example.com");
        assert!(info.supports_starttls());
        assert!(info.supports_8bitmime());
        assert_eq!(
            info.auth_mechanisms(),
            vec![AuthMechanism::Plain, AuthMechanism::Login]
        );
        assert_eq!(session.state(), SessionState::Greeted);
    }

    #[tokio::test]
    async fn test_helo_fallback() {
        let mock = Builder::new()
            .read(b"220 old.example.com SMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"502 5.5.1 Command not implemented\r\n")
            .write(b"HELO client.test\r\n")
            .read(b"250 old.example.com\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());

        let info = session.greet().await.unwrap();
        assert!(info.extensions.is_empty());
        assert_eq!(session.state(), SessionState::Greeted);
    }

    #[tokio::test]
    async fn test_bad_greeting_ends_session() {
        let mock = Builder::new()
            .read(b"554 5.3.2 go away\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());

        let err = session.greet().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Greeting,
                code: Some(code),
                ..
            } if code.as_u16() == 554
        ));
        assert!(err.is_permanent());
        assert_eq!(session.state(), SessionState::Done);

        let again = session.greet().await.unwrap_err();
        assert!(again.to_string().contains("not allowed in state done"));
    }

    #[tokio::test]
    async fn test_garbled_greeting_is_malformed() {
        let mock = Builder::new().read(b"OK\r\n").build();
        let mut session = SmtpSession::new(mock, config());

        let err = session.greet().await.unwrap_err();
        assert!(matches!(err, Error::MalformedReply(ref line) if line == "OK"));
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_auth_plain() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(EHLO_REPLY)
            .write(b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();

        session
            .authenticate(&Credentials::new("user", "pass"))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_auth_login_when_plain_missing() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250-smtp.example.com\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();

        session
            .authenticate(&Credentials::new("user", "pass"))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_auth_rejected() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(EHLO_REPLY)
            .write(b"AUTH PLAIN AHVzZXIAd3Jvbmc=\r\n")
            .read(b"535 5.7.8 Username and Password not accepted\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();

        let err = session
            .authenticate(&Credentials::new("user", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth { code, .. } if code == ReplyCode::AUTH_FAILED));
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_transaction_without_auth() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250 smtp.example.com\r\n")
            .write(b"MAIL FROM:<a@example.com>\r\n")
            .read(b"250 2.1.0 OK\r\n")
            .write(b"RCPT TO:<b@example.com>\r\n")
            .read(b"251 2.1.5 forwarding\r\n")
            .write(b"DATA\r\n")
            .read(b"354 Go ahead\r\n")
            .write(b"Subject: hi\r\n\r\nbody")
            .write(b"\r\n")
            .write(b".\r\n")
            .read(b"250 2.0.0 OK queued as 1234\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 2.0.0 closing connection\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();

        session.begin_message("a@example.com").await.unwrap();
        assert_eq!(session.state(), SessionState::MailStarted);
        session.add_recipient("b@example.com").await.unwrap();
        assert_eq!(session.state(), SessionState::RecipientAdded);

        let reply = session.send(b"Subject: hi\r\n\r\nbody").await.unwrap();
        assert!(reply.message_text().contains("queued as 1234"));
        assert_eq!(session.state(), SessionState::Greeted);

        session.quit().await.unwrap();
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_out_of_order_sends_nothing() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250 smtp.example.com\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();

        let err = session.add_recipient("b@example.com").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Command("RCPT TO"),
                code: None,
                ..
            }
        ));
        let err = session.send(b"x\r\n").await.unwrap_err();
        assert!(matches!(err, Error::Protocol { code: None, .. }));
        assert_eq!(session.state(), SessionState::Greeted);
    }

    #[tokio::test]
    async fn test_invalid_address_sends_nothing() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250 smtp.example.com\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();

        let err = session.begin_message("not-an-address").await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
        assert_eq!(session.state(), SessionState::Greeted);
    }

    #[tokio::test]
    async fn test_transient_recipient_failure() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250 smtp.example.com\r\n")
            .write(b"MAIL FROM:<a@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<b@example.com>\r\n")
            .read(b"450 4.2.1 mailbox busy\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();
        session.begin_message("a@example.com").await.unwrap();

        let err = session.add_recipient("b@example.com").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_reset_returns_to_ready() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250 smtp.example.com\r\n")
            .write(b"MAIL FROM:<a@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RSET\r\n")
            .read(b"250 flushed\r\n")
            .write(b"NOOP\r\n")
            .read(b"250 OK\r\n")
            .build();
        let mut session = SmtpSession::new(mock, config());
        session.greet().await.unwrap();
        session.begin_message("a@example.com").await.unwrap();

        session.reset().await.unwrap();
        assert_eq!(session.state(), SessionState::Greeted);
        session.noop().await.unwrap();
        assert_eq!(session.state(), SessionState::Greeted);
    }

    #[tokio::test]
    async fn test_closed_connection_is_transport_error() {
        let mock = Builder::new().read(b"220 smtp.exa").build();
        let mut session = SmtpSession::new(mock, config());

        assert!(matches!(
            session.greet().await,
            Err(Error::Transport(_))
        ));
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_server_times_out() {
        let (client, _server) = tokio::io::duplex(256);
        let framer = mailloop_wire::FramerConfig::default().io_timeout(Some(Duration::from_secs(30)));
        let mut session = SmtpSession::new(client, config().framer(framer));

        let err = session.greet().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(session.state(), SessionState::Done);
    }
}
