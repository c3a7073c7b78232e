//! Bracketed response codes.

use super::{Capability, Flag, SeqNum, Uid, UidValidity};

/// Code in square brackets at the start of a status response's text.
///
/// The codes that SELECT and LOGIN report get their own variant; the rest
/// are kept by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `ALERT`: the text must be shown to the user.
    Alert,
    /// `CAPABILITY`, sent with a greeting or LOGIN completion.
    Capability(Vec<Capability>),
    /// `PERMANENTFLAGS`
    PermanentFlags(Vec<Flag>),
    /// `READ-ONLY`
    ReadOnly,
    /// `READ-WRITE`
    ReadWrite,
    /// `UIDNEXT`
    UidNext(Uid),
    /// `UIDVALIDITY`
    UidValidity(UidValidity),
    /// `UNSEEN`: first unseen message.
    Unseen(SeqNum),
    /// Any other code, by its upper-cased name. Arguments are dropped.
    Other(String),
}
