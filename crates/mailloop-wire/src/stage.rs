//! Session stages used to locate failures.

use std::fmt;

/// Point in a session where an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Opening the transport.
    Connect,
    /// Reading the server greeting.
    Greeting,
    /// Negotiating TLS on an open connection.
    Tls,
    /// Presenting credentials.
    Auth,
    /// A named protocol command.
    Command(&'static str),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Greeting => write!(f, "greeting"),
            Self::Tls => write!(f, "TLS negotiation"),
            Self::Auth => write!(f, "authentication"),
            Self::Command(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Stage::Connect.to_string(), "connect");
        assert_eq!(Stage::Auth.to_string(), "authentication");
        assert_eq!(Stage::Command("RCPT TO").to_string(), "RCPT TO");
    }
}
