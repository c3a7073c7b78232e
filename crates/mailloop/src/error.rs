//! Error types for the round-trip probe.

use thiserror::Error;

/// Errors that can occur while probing an account.
#[derive(Debug, Error)]
pub enum Error {
    /// Connecting to a server failed.
    #[error("connection error: {0}")]
    Connect(#[from] mailloop_wire::Error),

    /// Submission failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] mailloop_smtp::Error),

    /// Retrieval over POP3 failed.
    #[error("POP3 error: {0}")]
    Pop3(#[from] mailloop_pop3::Error),

    /// Retrieval over IMAP failed.
    #[error("IMAP error: {0}")]
    Imap(#[from] mailloop_imap::Error),

    /// The retrieved message could not be decoded.
    #[error("message error: {0}")]
    Mime(#[from] mailloop_mime::Error),

    /// The account configuration cannot be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// Nothing was waiting in the mailbox.
    #[error("mailbox is empty")]
    EmptyMailbox,

    /// The retrieved message differs from the one sent.
    #[error("{field} mismatch: expected {expected:?}, got {actual:?}")]
    Mismatch {
        /// Which field differed.
        field: &'static str,
        /// Value that was sent.
        expected: String,
        /// Value that came back.
        actual: String,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display() {
        let err = Error::Mismatch {
            field: "subject",
            expected: "a".to_string(),
            actual: "b".to_string(),
        };
        assert_eq!(err.to_string(), "subject mismatch: expected \"a\", got \"b\"");
    }
}
