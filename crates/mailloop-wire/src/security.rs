//! Connection security modes.

/// Mail protocol spoken over a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Message submission.
    Smtp,
    /// Post Office Protocol v3.
    Pop3,
    /// Internet Message Access Protocol.
    Imap,
}

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption. **Not recommended for production.**
    None,
    /// Start with plaintext, upgrade with STARTTLS.
    StartTls,
    /// TLS from the start. **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Returns the conventional port for this security mode and protocol.
    #[must_use]
    pub const fn default_port(self, protocol: Protocol) -> u16 {
        match (protocol, self) {
            (Protocol::Smtp, Self::None) => 25,
            (Protocol::Smtp, Self::StartTls) => 587,
            (Protocol::Smtp, Self::Implicit) => 465,
            (Protocol::Pop3, Self::None | Self::StartTls) => 110,
            (Protocol::Pop3, Self::Implicit) => 995,
            (Protocol::Imap, Self::None | Self::StartTls) => 143,
            (Protocol::Imap, Self::Implicit) => 993,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(Security::StartTls.default_port(Protocol::Smtp), 587);
        assert_eq!(Security::Implicit.default_port(Protocol::Smtp), 465);
        assert_eq!(Security::None.default_port(Protocol::Smtp), 25);
        assert_eq!(Security::Implicit.default_port(Protocol::Imap), 993);
        assert_eq!(Security::StartTls.default_port(Protocol::Imap), 143);
        assert_eq!(Security::Implicit.default_port(Protocol::Pop3), 995);
        assert_eq!(Security::None.default_port(Protocol::Pop3), 110);
    }

    #[test]
    fn test_default_is_implicit() {
        assert_eq!(Security::default(), Security::Implicit);
    }
}
