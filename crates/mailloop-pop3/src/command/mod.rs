//! POP3 command builder.

/// POP3 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// USER - Name the mailbox
    User(String),
    /// PASS - Present the password
    Pass(String),
    /// APOP - Digest login
    Apop {
        /// Mailbox name
        user: String,
        /// Lowercase hex MD5 of the greeting timestamp and the secret
        digest: String,
    },
    /// STAT - Message count and maildrop size
    Stat,
    /// RETR - Retrieve a message
    Retr(u32),
    /// DELE - Mark a message deleted
    Dele(u32),
    /// RSET - Unmark all deletions
    Rset,
    /// NOOP - No operation
    Noop,
    /// QUIT - Commit deletions and close
    Quit,
}

impl Command {
    /// Serializes the command without its CRLF terminator.
    #[must_use]
    pub fn serialize(&self) -> String {
        match self {
            Self::User(name) => format!("USER {name}"),
            Self::Pass(secret) => format!("PASS {secret}"),
            Self::Apop { user, digest } => format!("APOP {user} {digest}"),
            Self::Stat => "STAT".to_string(),
            Self::Retr(n) => format!("RETR {n}"),
            Self::Dele(n) => format!("DELE {n}"),
            Self::Rset => "RSET".to_string(),
            Self::Noop => "NOOP".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
    }

    /// Command keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::User(_) => "USER",
            Self::Pass(_) => "PASS",
            Self::Apop { .. } => "APOP",
            Self::Stat => "STAT",
            Self::Retr(_) => "RETR",
            Self::Dele(_) => "DELE",
            Self::Rset => "RSET",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }

    /// Text safe to log.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Pass(_) => "PASS <redacted>".to_string(),
            Self::Apop { user, .. } => format!("APOP {user} <redacted>"),
            other => other.serialize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        assert_eq!(Command::User("alice".into()).serialize(), "USER alice");
        assert_eq!(Command::Retr(3).serialize(), "RETR 3");
        assert_eq!(Command::Dele(12).serialize(), "DELE 12");
        assert_eq!(Command::Stat.serialize(), "STAT");
        assert_eq!(Command::Quit.serialize(), "QUIT");
    }

    #[test]
    fn test_secrets_are_redacted() {
        let pass = Command::Pass("hunter2".into());
        assert_eq!(pass.serialize(), "PASS hunter2");
        assert_eq!(pass.redacted(), "PASS <redacted>");

        let apop = Command::Apop {
            user: "mrose".into(),
            digest: "c4c9334bac560ecc979e58001b3e22fb".into(),
        };
        assert_eq!(apop.redacted(), "APOP mrose <redacted>");
        assert_eq!(apop.name(), "APOP");
    }
}
