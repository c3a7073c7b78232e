//! Parsed response data.

use crate::types::{Capability, Flags, ResponseCode, SeqNum, Uid};

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `FLAGS`
    Flags(Flags),
    /// `INTERNALDATE`, unparsed.
    InternalDate(String),
    /// `RFC822.SIZE`
    Rfc822Size(u32),
    /// `ENVELOPE`
    Envelope(Box<Envelope>),
    /// `UID`
    Uid(Uid),
    /// `BODY[section]<origin>` content. `RFC822`, `RFC822.HEADER` and
    /// `RFC822.TEXT` arrive here as sections `None`, `HEADER` and `TEXT`.
    Body {
        /// Section, `None` for the whole message.
        section: Option<String>,
        /// Start offset when only part was requested.
        origin: Option<u32>,
        /// The bytes, `None` if the server sent NIL.
        data: Option<Vec<u8>>,
    },
}

/// The ENVELOPE structure. Header values are as the server sent them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// `Date`
    pub date: Option<String>,
    /// `Subject`, possibly RFC 2047 encoded.
    pub subject: Option<String>,
    /// `From`
    pub from: Vec<Address>,
    /// `Sender`
    pub sender: Vec<Address>,
    /// `Reply-To`
    pub reply_to: Vec<Address>,
    /// `To`
    pub to: Vec<Address>,
    /// `Cc`
    pub cc: Vec<Address>,
    /// `Bcc`
    pub bcc: Vec<Address>,
    /// `In-Reply-To`
    pub in_reply_to: Option<String>,
    /// `Message-ID`
    pub message_id: Option<String>,
}

/// One address of an envelope list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Obsolete source route.
    pub adl: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain.
    pub host: Option<String>,
}

impl Address {
    /// `mailbox@host`, if both parts are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        Some(format!("{}@{}", self.mailbox.as_ref()?, self.host.as_ref()?))
    }
}

/// Data the server sends outside a command completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`
    Ok {
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Text after the code.
        text: String,
    },
    /// `* NO`: a warning.
    No {
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Text after the code.
        text: String,
    },
    /// `* BAD`: the server could not make sense of something.
    Bad {
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Text after the code.
        text: String,
    },
    /// `* PREAUTH` greeting.
    PreAuth {
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Text after the code.
        text: String,
    },
    /// `* BYE`: the server is about to close the connection.
    Bye {
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Text after the code.
        text: String,
    },
    /// `* CAPABILITY`
    Capability(Vec<Capability>),
    /// `* FLAGS`: flags defined in the selected mailbox.
    Flags(Flags),
    /// `* n EXISTS`: the mailbox now holds `n` messages.
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`: message `n` is gone and later ones move down.
    Expunge(SeqNum),
    /// `* n FETCH (...)`
    Fetch {
        /// Message the data belongs to.
        seq: SeqNum,
        /// Items in the order received.
        items: Vec<FetchItem>,
    },
    /// Any other untagged data, kept as text.
    Other {
        /// Response keyword, uppercased.
        keyword: String,
        /// Everything after the `*`, without the final CRLF.
        text: String,
    },
}

impl UntaggedResponse {
    /// Whether this is an OK, NO or BAD carrying `[ALERT]`.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        match self {
            Self::Ok { code, .. } | Self::No { code, .. } | Self::Bad { code, .. } => {
                matches!(code, Some(ResponseCode::Alert))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(mailbox: Option<&str>, host: Option<&str>) -> Address {
        Address {
            name: None,
            adl: None,
            mailbox: mailbox.map(str::to_string),
            host: host.map(str::to_string),
        }
    }

    #[test]
    fn test_email_needs_both_parts() {
        assert_eq!(
            address(Some("probe"), Some("example.com")).email().as_deref(),
            Some("probe@example.com")
        );
        assert_eq!(address(Some("probe"), None).email(), None);
        assert_eq!(address(None, Some("example.com")).email(), None);
    }

    #[test]
    fn test_alert_detection() {
        let alert = UntaggedResponse::Ok {
            code: Some(ResponseCode::Alert),
            text: "maintenance at noon".into(),
        };
        assert!(alert.is_alert());
        assert!(!UntaggedResponse::Exists(1).is_alert());
    }
}
