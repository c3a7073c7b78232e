//! Error types for the IMAP session.

use std::io;
use std::time::Duration;

use mailloop_wire::Stage;
use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection failed or closed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The server did not answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A response could not be parsed.
    #[error("parse error at position {position}: {message} (near {fragment:?})")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
        /// Raw bytes around the position, lossily decoded.
        fragment: String,
    },

    /// The server answered NO or BAD, sent something unexpected, or the
    /// command is not valid in the session's current state.
    #[error("protocol error during {stage}: {text}")]
    Protocol {
        /// Where the failure happened.
        stage: Stage,
        /// Server text or a description of the violation.
        text: String,
    },

    /// The server rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server closed the session with BYE.
    #[error("server sent BYE: {0}")]
    Bye(String),

    /// A fetched message could not be decoded.
    #[error("message decode failed: {0}")]
    Decode(#[from] mailloop_mime::Error),
}

impl Error {
    /// Converts a transport-layer error raised during `stage`.
    ///
    /// Framing limit violations become protocol errors.
    #[must_use]
    pub fn from_wire(err: mailloop_wire::Error, stage: Stage) -> Self {
        match err {
            mailloop_wire::Error::Transport(e) => Self::Transport(e),
            mailloop_wire::Error::Timeout(d) => Self::Timeout(d),
            e => Self::Protocol {
                stage,
                text: e.to_string(),
            },
        }
    }

    pub(crate) fn protocol(stage: Stage, text: impl Into<String>) -> Self {
        Self::Protocol {
            stage,
            text: text.into(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_includes_fragment() {
        let err = Error::Parse {
            position: 7,
            message: "Expected number".into(),
            fragment: "* FETCH".into(),
        };
        assert_eq!(
            err.to_string(),
            "parse error at position 7: Expected number (near \"* FETCH\")"
        );
    }

    #[test]
    fn test_framing_violation_is_protocol_error() {
        let err = Error::from_wire(
            mailloop_wire::Error::LiteralTooLarge { size: 10, limit: 5 },
            Stage::Command("FETCH"),
        );
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Command("FETCH"),
                ..
            }
        ));
    }
}
