//! Typed access to the data of one FETCH response.

use mailloop_mime::FetchedMessage;
use mailloop_mime::encoding::decode_rfc2047;

use crate::Result;
use crate::parser::{Envelope, FetchItem};
use crate::types::{Flags, SeqNum, Uid};

/// Items the server returned for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageData {
    /// Message sequence number.
    pub seq: SeqNum,
    /// Items in the order the server sent them.
    pub items: Vec<FetchItem>,
}

impl MessageData {
    /// Returns the UID, if fetched.
    #[must_use]
    pub fn uid(&self) -> Option<Uid> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Uid(uid) => Some(*uid),
            _ => None,
        })
    }

    /// Returns the flags, if fetched.
    #[must_use]
    pub fn flags(&self) -> Option<&Flags> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Flags(flags) => Some(flags),
            _ => None,
        })
    }

    /// Returns `RFC822.SIZE`, if fetched.
    #[must_use]
    pub fn size(&self) -> Option<u32> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Rfc822Size(size) => Some(*size),
            _ => None,
        })
    }

    /// Returns the envelope, if fetched.
    #[must_use]
    pub fn envelope(&self) -> Option<&Envelope> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Envelope(envelope) => Some(&**envelope),
            _ => None,
        })
    }

    /// Returns the envelope subject with RFC 2047 words decoded.
    ///
    /// Undecodable words are returned as sent.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        let raw = self.envelope()?.subject.as_deref()?;
        Some(decode_rfc2047(raw).unwrap_or_else(|_| raw.to_string()))
    }

    /// Returns the bytes of a body section: `None` selects the whole
    /// message, `Some("TEXT")` the body without headers.
    #[must_use]
    pub fn body(&self, section: Option<&str>) -> Option<&[u8]> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Body {
                section: s,
                data: Some(data),
                ..
            } if s.as_deref().map(str::to_ascii_uppercase).as_deref() == section => {
                Some(data.as_slice())
            }
            _ => None,
        })
    }

    /// Decodes the fetched content into a message.
    ///
    /// Uses the whole message when present. Otherwise `HEADER` and `TEXT`
    /// sections are joined; a lone `TEXT` takes its subject from the
    /// envelope. Returns `Ok(None)` when no content was fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be decoded.
    pub fn message(&self) -> Result<Option<FetchedMessage>> {
        let message = if let Some(raw) = self.body(None) {
            mailloop_mime::parse(raw)?
        } else if let Some(text) = self.body(Some("TEXT")) {
            let header = self.body(Some("HEADER")).unwrap_or(b"\r\n");
            let mut raw = header.to_vec();
            raw.extend_from_slice(text);
            let mut message = mailloop_mime::parse(&raw)?;
            if message.subject.is_empty() {
                message.subject = self.subject().unwrap_or_default();
            }
            message
        } else {
            return Ok(None);
        };

        Ok(Some(message.with_sequence(self.seq.get())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Flag;

    fn seq(n: u32) -> SeqNum {
        SeqNum::new(n).unwrap()
    }

    fn body(section: Option<&str>, data: &[u8]) -> FetchItem {
        FetchItem::Body {
            section: section.map(ToString::to_string),
            origin: None,
            data: Some(data.to_vec()),
        }
    }

    #[test]
    fn test_typed_accessors() {
        let data = MessageData {
            seq: seq(3),
            items: vec![
                FetchItem::Uid(Uid::new(42).unwrap()),
                FetchItem::Flags([Flag::Seen].into_iter().collect()),
                FetchItem::Rfc822Size(120),
            ],
        };
        assert_eq!(data.uid().map(Uid::get), Some(42));
        assert!(data.flags().unwrap().is_seen());
        assert_eq!(data.size(), Some(120));
        assert!(data.envelope().is_none());
        assert!(data.message().unwrap().is_none());
    }

    #[test]
    fn test_whole_message_decoded() {
        let data = MessageData {
            seq: seq(5),
            items: vec![body(None, b"Subject: hi\r\n\r\n..kept\r\n")],
        };
        let message = data.message().unwrap().unwrap();
        assert_eq!(message.subject, "hi");
        assert_eq!(message.body, "..kept");
        assert_eq!(message.sequence, Some(5));
    }

    #[test]
    fn test_text_section_uses_envelope_subject() {
        let envelope = Envelope {
            subject: Some("=?utf-8?Q?caf=C3=A9?=".into()),
            ..Envelope::default()
        };
        let data = MessageData {
            seq: seq(1),
            items: vec![
                FetchItem::Envelope(Box::new(envelope)),
                body(Some("TEXT"), b"plain body\r\n"),
            ],
        };
        assert_eq!(data.subject().as_deref(), Some("café"));
        let message = data.message().unwrap().unwrap();
        assert_eq!(message.subject, "café");
        assert_eq!(message.body, "plain body");
    }

    #[test]
    fn test_header_and_text_joined() {
        let data = MessageData {
            seq: seq(2),
            items: vec![
                body(Some("HEADER"), b"Subject: split\r\n\r\n"),
                body(Some("text"), b"second half\r\n"),
            ],
        };
        let message = data.message().unwrap().unwrap();
        assert_eq!(message.subject, "split");
        assert_eq!(message.body, "second half");
    }
}
