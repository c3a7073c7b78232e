//! Selected mailbox state.

use super::{Flags, SeqNum, Uid, UidValidity};

/// What SELECT reported about a mailbox, with the message count kept
/// current as EXISTS and EXPUNGE arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Name passed to SELECT.
    pub name: String,
    /// Message count.
    pub exists: u32,
    /// Messages with `\Recent` set.
    pub recent: u32,
    /// First message without `\Seen`, if reported.
    pub unseen: Option<SeqNum>,
    /// UID the next delivered message will get.
    pub uid_next: Option<Uid>,
    /// Current UIDVALIDITY.
    pub uid_validity: Option<UidValidity>,
    /// Flags in use in the mailbox.
    pub flags: Flags,
    /// Flags the client may change permanently.
    pub permanent_flags: Flags,
    /// Selected with `[READ-ONLY]`; STORE and EXPUNGE will fail.
    pub read_only: bool,
}

impl MailboxStatus {
    /// Empty status for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Highest valid sequence number, if the mailbox is not empty.
    #[must_use]
    pub const fn last(&self) -> Option<SeqNum> {
        SeqNum::new(self.exists)
    }
}
