//! IMAP session management.

mod session;

pub use session::ImapSession;

use std::fmt;

/// Position of a session in the IMAP dialogue (RFC 3501 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Greeting read; LOGIN not yet accepted.
    NotAuthenticated,
    /// Logged in; no mailbox selected.
    Authenticated,
    /// A mailbox is selected.
    Selected,
    /// Session over, by LOGOUT or by failure.
    Logout,
}

impl SessionState {
    /// Returns true once the session can no longer be used.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Logout)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotAuthenticated => "not authenticated",
            Self::Authenticated => "authenticated",
            Self::Selected => "selected",
            Self::Logout => "logout",
        };
        f.write_str(name)
    }
}
