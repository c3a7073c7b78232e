//! Server capabilities and response status.

use std::fmt;

/// Status word of a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// The command was understood but refused.
    No,
    /// The command was malformed or not allowed here.
    Bad,
    /// Greeting of a connection that is already authenticated.
    PreAuth,
    /// The server is closing the connection.
    Bye,
}

impl Status {
    /// Whether the status reports success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a CAPABILITY list.
///
/// Only the capabilities this client looks at get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1`
    Imap4Rev1,
    /// `IMAP4rev2`
    Imap4Rev2,
    /// `IDLE`
    Idle,
    /// `LITERAL+`: non-synchronizing literals.
    LiteralPlus,
    /// `STARTTLS`
    StartTls,
    /// `LOGINDISABLED`: LOGIN is refused on this connection.
    LoginDisabled,
    /// `AUTH=<mechanism>`
    Auth(String),
    /// Anything else, as advertised.
    Other(String),
}

impl Capability {
    /// Parses one capability atom, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if let Some(prefix) = s.get(..5)
            && prefix.eq_ignore_ascii_case("AUTH=")
        {
            return Self::Auth(s[5..].to_string());
        }
        match s.to_ascii_uppercase().as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "IDLE" => Self::Idle,
            "LITERAL+" => Self::LiteralPlus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Imap4Rev1 => "IMAP4rev1",
            Self::Imap4Rev2 => "IMAP4rev2",
            Self::Idle => "IDLE",
            Self::LiteralPlus => "LITERAL+",
            Self::StartTls => "STARTTLS",
            Self::LoginDisabled => "LOGINDISABLED",
            Self::Auth(mechanism) => return write!(f, "AUTH={mechanism}"),
            Self::Other(other) => other,
        };
        f.write_str(name)
    }
}
