//! Round trips against a configured account.

use std::time::Instant;

use chrono::Utc;
use mailloop_mime::{FetchedMessage, OutgoingMessage};
use mailloop_smtp::{SmtpConfig, SmtpSession};
use mailloop_wire::{Credentials, FramerConfig, MailStream, Security, connect};
use tracing::{info, instrument};

use crate::config::{AccountConfig, Retrieval, ServerConfig};
use crate::error::{Error, Result};
use crate::probe::{self, RoundTripReport};

/// Sends probe messages to an account and reads them back.
///
/// Every step opens its own connection; nothing is kept between calls.
#[derive(Debug, Clone)]
pub struct Prober {
    config: AccountConfig,
}

impl Prober {
    /// Creates a prober for `config`.
    #[must_use]
    pub const fn new(config: AccountConfig) -> Self {
        Self { config }
    }

    /// Returns the account configuration.
    #[must_use]
    pub const fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Sends a probe carrying `id` to the account's own address, reads the
    /// newest message back, deletes it and checks it matches.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any step, [`Error::EmptyMailbox`] if
    /// nothing arrived, or [`Error::Mismatch`] if the newest message is not
    /// the probe.
    #[instrument(skip(self, credentials), fields(account = credentials.username()))]
    pub async fn run(&self, credentials: &Credentials, id: &str) -> Result<RoundTripReport> {
        let started = Instant::now();
        let message = probe::probe_message(credentials.username(), id).with_date(Utc::now());

        self.submit(credentials, &message).await?;
        let received = self.retrieve(credentials).await?;
        probe::verify(&message, &received)?;

        let report = RoundTripReport {
            id: id.to_string(),
            subject: received.subject,
            sequence: received.sequence,
            protocol: self.config.retrieval.protocol(),
            elapsed: started.elapsed(),
        };
        info!(elapsed_ms = report.elapsed.as_millis(), "round trip verified");
        Ok(report)
    }

    /// Submits `message` through the account's SMTP server.
    ///
    /// # Errors
    ///
    /// Returns a connection or SMTP failure.
    pub async fn submit(&self, credentials: &Credentials, message: &OutgoingMessage) -> Result<()> {
        let server = &self.config.smtp;
        let stream = open(server).await?;
        let config =
            SmtpConfig::new(self.config.client_hostname.clone()).framer(self.framer());
        let mut session = SmtpSession::new(stream, config);

        if server.security == Security::StartTls {
            session.greet().await?;
            session = session.starttls(&server.host).await?;
        }
        probe::submit(&mut session, Some(credentials), message).await
    }

    /// Reads back, deletes and returns the newest message on the
    /// retrieval server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a STARTTLS retrieval server, which is
    /// not supported, [`Error::EmptyMailbox`], or a connection or protocol
    /// failure.
    pub async fn retrieve(&self, credentials: &Credentials) -> Result<FetchedMessage> {
        let server = self.config.retrieval.server();
        if server.security == Security::StartTls {
            return Err(Error::Config(format!(
                "STARTTLS is not supported for {:?} retrieval; use implicit TLS",
                self.config.retrieval.protocol()
            )));
        }

        let stream = open(server).await?;
        match &self.config.retrieval {
            Retrieval::Imap(_) => {
                probe::retrieve_latest_imap(
                    stream,
                    self.framer(),
                    credentials,
                    &self.config.mailbox,
                )
                .await
            }
            Retrieval::Pop3(_) => {
                probe::retrieve_latest_pop3(stream, self.framer(), credentials).await
            }
        }
    }

    fn framer(&self) -> FramerConfig {
        FramerConfig::default().io_timeout(self.config.io_timeout)
    }
}

async fn open(server: &ServerConfig) -> Result<MailStream> {
    Ok(connect(
        &server.host,
        server.port,
        server.security,
        server.connect_timeout,
    )
    .await?)
}
