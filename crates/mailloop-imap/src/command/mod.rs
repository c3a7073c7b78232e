//! IMAP command builder.
//!
//! This module provides types and serialization for the commands a
//! retrieval session issues.

mod serialize;
mod tag_generator;
mod types;

use crate::types::SequenceSet;

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, StoreAction};

use serialize::{Writer, write_fetch_items, write_store_action};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    // Authenticated State Commands
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },

    // Selected State Commands
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
    },
    /// STORE command.
    Store {
        /// Sequence set.
        sequence: SequenceSet,
        /// Store action.
        action: StoreAction,
    },
    /// EXPUNGE command.
    Expunge,
    /// CLOSE command.
    Close,
}

impl Command {
    /// Serializes the command with the given tag.
    ///
    /// Returns one part per synchronizing literal plus one. Each part but
    /// the last ends with a literal announcement and must be followed by
    /// a continuation from the server before the next is written.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<Vec<u8>> {
        let mut w = Writer::new();
        w.raw(tag.as_bytes());
        w.space();
        w.raw(self.name().as_bytes());

        match self {
            Self::Capability | Self::Noop | Self::Logout | Self::Expunge | Self::Close => {}
            Self::Login { username, password } => {
                w.space();
                w.astring(username);
                w.space();
                w.astring(password);
            }
            Self::Select { mailbox } => {
                w.space();
                w.astring(mailbox);
            }
            Self::Fetch { sequence, items } => {
                w.space();
                w.raw(sequence.to_string().as_bytes());
                w.space();
                write_fetch_items(&mut w, items);
            }
            Self::Store { sequence, action } => {
                w.space();
                w.raw(sequence.to_string().as_bytes());
                w.space();
                write_store_action(&mut w, action);
            }
        }

        w.finish()
    }

    /// Returns the command keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::Fetch { .. } => "FETCH",
            Self::Store { .. } => "STORE",
            Self::Expunge => "EXPUNGE",
            Self::Close => "CLOSE",
        }
    }

    /// Returns the command line for logging, with the password masked.
    #[must_use]
    pub fn redacted(&self, tag: &str) -> String {
        match self {
            Self::Login { username, .. } => format!("{tag} LOGIN {username} ****"),
            _ => {
                let parts = self.serialize(tag);
                let joined: Vec<u8> = parts.concat();
                String::from_utf8_lossy(&joined).trim_end().to_string()
            }
        }
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
    use crate::types::Flag;

    fn single(cmd: &Command, tag: &str) -> String {
        let parts = cmd.serialize(tag);
        assert_eq!(parts.len(), 1);
        String::from_utf8(parts.into_iter().next().unwrap()).unwrap()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(single(&Command::Capability, "A0000"), "A0000 CAPABILITY\r\n");
        assert_eq!(single(&Command::Noop, "A0001"), "A0001 NOOP\r\n");
        assert_eq!(single(&Command::Expunge, "A0002"), "A0002 EXPUNGE\r\n");
        assert_eq!(single(&Command::Close, "A0003"), "A0003 CLOSE\r\n");
        assert_eq!(single(&Command::Logout, "A0004"), "A0004 LOGOUT\r\n");
    }

    #[test]
    fn test_login_quotes_when_needed() {
        let cmd = Command::Login {
            username: "probe@example.com".into(),
            password: "app password".into(),
        };
        assert_eq!(
            single(&cmd, "A0001"),
            "A0001 LOGIN probe@example.com \"app password\"\r\n"
        );
    }

    #[test]
    fn test_login_literal_parts() {
        let cmd = Command::Login {
            username: "probe".into(),
            password: "naïve".into(),
        };
        let parts = cmd.serialize("A0001");
        assert_eq!(
            parts,
            vec![b"A0001 LOGIN probe {6}\r\n".to_vec(), "naïve\r\n".as_bytes().to_vec()]
        );
    }

    #[test]
    fn test_login_redacted() {
        let cmd = Command::Login {
            username: "probe".into(),
            password: "secret".into(),
        };
        let line = cmd.redacted("A0001");
        assert_eq!(line, "A0001 LOGIN probe ****");
        assert!(!line.contains("secret"));
    }

    #[test]
    fn test_select() {
        let cmd = Command::Select {
            mailbox: "INBOX".into(),
        };
        assert_eq!(single(&cmd, "A0002"), "A0002 SELECT INBOX\r\n");
        let cmd = Command::Select {
            mailbox: "[Gmail]/All Mail".into(),
        };
        assert_eq!(single(&cmd, "A0002"), "A0002 SELECT \"[Gmail]/All Mail\"\r\n");
    }

    #[test]
    fn test_fetch_full_message() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::single(7).unwrap(),
            items: FetchItems::full_message(),
        };
        assert_eq!(
            single(&cmd, "A0003"),
            "A0003 FETCH 7 (UID FLAGS RFC822.SIZE BODY.PEEK[])\r\n"
        );
        assert_eq!(cmd.redacted("A0003"), "A0003 FETCH 7 (UID FLAGS RFC822.SIZE BODY.PEEK[])");
    }

    #[test]
    fn test_fetch_single_attribute_partial() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::range(1, 3).unwrap(),
            items: FetchItems::Items(vec![FetchAttribute::Body {
                section: Some("TEXT".into()),
                peek: false,
                partial: Some((0, 512)),
            }]),
        };
        assert_eq!(single(&cmd, "A0004"), "A0004 FETCH 1:3 BODY[TEXT]<0.512>\r\n");
    }

    #[test]
    fn test_store() {
        let cmd = Command::Store {
            sequence: SequenceSet::single(2).unwrap(),
            action: StoreAction::AddFlags(vec![Flag::Deleted, Flag::Seen]),
        };
        assert_eq!(
            single(&cmd, "A0005"),
            "A0005 STORE 2 +FLAGS (\\Deleted \\Seen)\r\n"
        );
    }
}
