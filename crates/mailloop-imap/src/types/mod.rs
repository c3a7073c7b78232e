//! Core IMAP types: identifiers, flags, sequence sets, capabilities and
//! mailbox status.

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::MailboxStatus;
pub use response_code::ResponseCode;
pub use sequence::SequenceSet;
