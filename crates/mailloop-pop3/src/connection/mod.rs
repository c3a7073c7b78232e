//! POP3 session management.

mod session;

pub use session::{Pop3Session, apop_digest};

use std::fmt;

/// Position of a session in the POP3 dialogue (RFC 1939 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Greeting read; credentials not yet accepted.
    Authorization,
    /// Logged in; the maildrop is locked.
    Transaction,
    /// QUIT sent; the server is committing deletions.
    Update,
    /// Session over, by QUIT or by failure.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authorization => "authorization",
            Self::Transaction => "transaction",
            Self::Update => "update",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Reply to STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaildropStat {
    /// Messages in the maildrop, excluding those marked deleted.
    pub count: u32,
    /// Total size in octets.
    pub size: u64,
}
