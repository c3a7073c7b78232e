//! SMTP session management.

mod session;

pub use session::SmtpSession;

use std::collections::HashSet;
use std::fmt;

use mailloop_wire::FramerConfig;

use crate::types::{AuthMechanism, Extension};

/// Position of a session in the submission dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Transport open, greeting not yet read.
    Connected,
    /// Greeting read and EHLO/HELO accepted.
    Greeted,
    /// AUTH accepted.
    Authenticated,
    /// MAIL FROM accepted.
    MailStarted,
    /// At least one RCPT TO accepted.
    RecipientAdded,
    /// DATA accepted, payload in flight.
    DataSending,
    /// QUIT completed or the session failed.
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Greeted => "greeted",
            Self::Authenticated => "authenticated",
            Self::MailStarted => "mail started",
            Self::RecipientAdded => "recipient added",
            Self::DataSending => "data sending",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Server capabilities from EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Checks if 8BITMIME is supported.
    #[must_use]
    pub fn supports_8bitmime(&self) -> bool {
        self.supports(&Extension::EightBitMime)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns supported authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Settings for an SMTP session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    /// Name announced in EHLO/HELO.
    pub client_hostname: String,
    /// Line limits and read deadline.
    pub framer: FramerConfig,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            client_hostname: "localhost".to_string(),
            framer: FramerConfig::default(),
        }
    }
}

impl SmtpConfig {
    /// Creates a configuration announcing `client_hostname`.
    #[must_use]
    pub fn new(client_hostname: impl Into<String>) -> Self {
        Self {
            client_hostname: client_hostname.into(),
            ..Self::default()
        }
    }

    /// Sets the framing limits and read deadline.
    #[must_use]
    pub const fn framer(mut self, framer: FramerConfig) -> Self {
        self.framer = framer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_info_queries() {
        let mut info = ServerInfo::default();
        info.extensions.insert(Extension::Size(Some(1024)));
        info.extensions
            .insert(Extension::Auth(vec![AuthMechanism::Login]));
        info.extensions.insert(Extension::EightBitMime);

        assert_eq!(info.max_message_size(), Some(1024));
        assert_eq!(info.auth_mechanisms(), vec![AuthMechanism::Login]);
        assert!(info.supports_8bitmime());
        assert!(!info.supports_starttls());
    }

    #[test]
    fn test_config_builder() {
        let config = SmtpConfig::new("probe.example.com")
            .framer(FramerConfig::default().io_timeout(Some(Duration::from_secs(5))));
        assert_eq!(config.client_hostname, "probe.example.com");
        assert_eq!(config.framer.io_timeout, Some(Duration::from_secs(5)));
        assert_eq!(SmtpConfig::default().client_hostname, "localhost");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::RecipientAdded.to_string(), "recipient added");
        assert_eq!(SessionState::Done.to_string(), "done");
    }
}
