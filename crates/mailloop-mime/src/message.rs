//! Message values exchanged with the codec.

use chrono::{DateTime, Utc};

/// A plain-text message to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    from: String,
    to: String,
    subject: String,
    body: String,
    date: Option<DateTime<Utc>>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            date: None,
        }
    }

    /// Sets the `Date` header value.
    #[must_use]
    pub const fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sender address.
    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient address.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Plain text body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Date header, if one was set.
    #[must_use]
    pub const fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

/// A message decoded from server bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Decoded subject, empty if the header is absent.
    pub subject: String,
    /// Decoded body with LF line endings and no trailing whitespace.
    pub body: String,
    /// Server-side message number, when fetched through a session.
    pub sequence: Option<u32>,
}

impl FetchedMessage {
    /// Records the server-side message number.
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_outgoing_accessors() {
        let date = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let msg = OutgoingMessage::new("a@example.com", "b@example.com", "Hi", "Body")
            .with_date(date);
        assert_eq!(msg.from(), "a@example.com");
        assert_eq!(msg.to(), "b@example.com");
        assert_eq!(msg.subject(), "Hi");
        assert_eq!(msg.body(), "Body");
        assert_eq!(msg.date(), Some(date));
    }

    #[test]
    fn test_fetched_with_sequence() {
        let msg = FetchedMessage::default().with_sequence(7);
        assert_eq!(msg.sequence, Some(7));
    }
}
