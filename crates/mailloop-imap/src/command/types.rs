//! Arguments of FETCH and STORE.

use crate::types::Flag;

/// What a FETCH asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// The `ALL` macro: flags, internal date, size and envelope.
    All,
    /// The `FAST` macro: flags, internal date and size.
    Fast,
    /// An explicit attribute list.
    Items(Vec<FetchAttribute>),
}

impl FetchItems {
    /// Flags, UID, size and the whole message, without setting `\Seen`.
    #[must_use]
    pub fn full_message() -> Self {
        Self::Items(vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::Rfc822Size,
            FetchAttribute::Body {
                section: None,
                peek: true,
                partial: None,
            },
        ])
    }
}

/// One requested FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `FLAGS`
    Flags,
    /// `INTERNALDATE`
    InternalDate,
    /// `RFC822.SIZE`
    Rfc822Size,
    /// `ENVELOPE`
    Envelope,
    /// `UID`
    Uid,
    /// `BODY[section]<start.count>`, or `BODY.PEEK[...]` when `peek` is
    /// set so the message is not marked `\Seen`.
    Body {
        /// Section such as `HEADER` or `TEXT`; `None` is the whole message.
        section: Option<String>,
        /// Leave `\Seen` alone.
        peek: bool,
        /// Start offset and octet count of a partial fetch.
        partial: Option<(u32, u32)>,
    },
    /// `RFC822`: the whole message, setting `\Seen`.
    Rfc822,
}

/// How STORE changes the flags of the addressed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// `FLAGS`: replace them.
    SetFlags(Vec<Flag>),
    /// `+FLAGS`: add to them.
    AddFlags(Vec<Flag>),
    /// `-FLAGS`: remove from them.
    RemoveFlags(Vec<Flag>),
}

impl StoreAction {
    pub(crate) const fn keyword(&self) -> &'static str {
        match self {
            Self::SetFlags(_) => "FLAGS",
            Self::AddFlags(_) => "+FLAGS",
            Self::RemoveFlags(_) => "-FLAGS",
        }
    }

    pub(crate) fn flags(&self) -> &[Flag] {
        match self {
            Self::SetFlags(flags) | Self::AddFlags(flags) | Self::RemoveFlags(flags) => flags,
        }
    }
}
