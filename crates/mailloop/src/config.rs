//! Account and server configuration.

use std::time::Duration;

use mailloop_wire::{Protocol, Security};

/// One server endpoint of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl ServerConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder::new(host)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a builder for `host` with implicit TLS.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Implicit,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builds the configuration. Without an explicit port, the conventional
    /// port for `protocol` and the chosen security mode is used.
    #[must_use]
    pub fn build(self, protocol: Protocol) -> ServerConfig {
        ServerConfig {
            port: self
                .port
                .unwrap_or_else(|| self.security.default_port(protocol)),
            host: self.host,
            security: self.security,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Where sent probes are read back from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Read the newest message of a mailbox over IMAP.
    Imap(ServerConfig),
    /// Read the newest message of the maildrop over POP3.
    Pop3(ServerConfig),
}

/// Which retrieval protocol a preset should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalKind {
    /// IMAP.
    #[default]
    Imap,
    /// POP3.
    Pop3,
}

impl Retrieval {
    /// Returns the server endpoint.
    #[must_use]
    pub const fn server(&self) -> &ServerConfig {
        match self {
            Self::Imap(server) | Self::Pop3(server) => server,
        }
    }

    /// Returns the protocol spoken to the server.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Imap(_) => Protocol::Imap,
            Self::Pop3(_) => Protocol::Pop3,
        }
    }
}

/// Everything needed to probe one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Submission server.
    pub smtp: ServerConfig,
    /// Retrieval server.
    pub retrieval: Retrieval,
    /// IMAP mailbox the probe is read back from.
    pub mailbox: String,
    /// Name announced in EHLO.
    pub client_hostname: String,
    /// Read deadline applied to every session.
    pub io_timeout: Option<Duration>,
}

impl AccountConfig {
    /// Creates a configuration reading back from `INBOX`.
    #[must_use]
    pub fn new(smtp: ServerConfig, retrieval: Retrieval) -> Self {
        Self {
            smtp,
            retrieval,
            mailbox: "INBOX".to_string(),
            client_hostname: "localhost".to_string(),
            io_timeout: Some(Duration::from_secs(60)),
        }
    }

    /// Gmail preset: submission on 587 with STARTTLS, retrieval over
    /// implicit TLS.
    #[must_use]
    pub fn gmail(kind: RetrievalKind) -> Self {
        let smtp = ServerConfig::builder("smtp.gmail.com")
            .security(Security::StartTls)
            .build(Protocol::Smtp);
        let retrieval = match kind {
            RetrievalKind::Imap => {
                Retrieval::Imap(ServerConfig::builder("imap.gmail.com").build(Protocol::Imap))
            }
            RetrievalKind::Pop3 => {
                Retrieval::Pop3(ServerConfig::builder("pop.gmail.com").build(Protocol::Pop3))
            }
        };
        Self::new(smtp, retrieval)
    }

    /// Sets the mailbox probes are read back from.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = mailbox.into();
        self
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn client_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.client_hostname = hostname.into();
        self
    }

    /// Sets the read deadline; `None` waits forever.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_port_from_security() {
        let config = ServerConfig::builder("mail.example.com")
            .security(Security::StartTls)
            .build(Protocol::Smtp);
        assert_eq!(config.port, 587);

        let config = ServerConfig::builder("mail.example.com").build(Protocol::Pop3);
        assert_eq!(config.port, 995);
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_explicit_port() {
        let config = ServerConfig::builder("localhost")
            .port(2525)
            .security(Security::None)
            .connect_timeout(Duration::from_secs(2))
            .build(Protocol::Smtp);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 2525);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_gmail_imap_preset() {
        let account = AccountConfig::gmail(RetrievalKind::Imap);
        assert_eq!(account.smtp.host, "smtp.gmail.com");
        assert_eq!(account.smtp.port, 587);
        assert_eq!(account.smtp.security, Security::StartTls);
        assert_eq!(account.retrieval.server().host, "imap.gmail.com");
        assert_eq!(account.retrieval.server().port, 993);
        assert_eq!(account.retrieval.protocol(), Protocol::Imap);
        assert_eq!(account.mailbox, "INBOX");
    }

    #[test]
    fn test_gmail_pop3_preset() {
        let account = AccountConfig::gmail(RetrievalKind::Pop3).mailbox("ignored");
        assert_eq!(account.retrieval.server().host, "pop.gmail.com");
        assert_eq!(account.retrieval.server().port, 995);
        assert_eq!(account.retrieval.protocol(), Protocol::Pop3);
    }

    #[test]
    fn test_account_setters() {
        let account = AccountConfig::gmail(RetrievalKind::Imap)
            .client_hostname("probe.example.com")
            .io_timeout(None);
        assert_eq!(account.client_hostname, "probe.example.com");
        assert_eq!(account.io_timeout, None);
    }
}
