//! Error types for POP3 operations.

use std::io;
use std::time::Duration;

use mailloop_wire::Stage;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection failed or closed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The server did not answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered `-ERR`, sent something unexpected, or the command
    /// is not valid in the session's current state.
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

    /// A status line was neither `+OK` nor `-ERR`.
    #[error("malformed response line: {0:?}")]
    MalformedResponse(String),

    /// The server did not offer what the command needs.
    #[error("server does not support {0}")]
    NotSupported(&'static str),

    /// A retrieved message could not be decoded.
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::Protocol {
            stage: Stage::Command("RETR"),
            text: "-ERR no such message".into(),
        };
        assert_eq!(
            err.to_string(),
            "protocol error during RETR: -ERR no such message"
        );
    }

    #[test]
    fn test_from_wire() {
        let err = Error::from_wire(
            mailloop_wire::Error::Timeout(Duration::from_secs(3)),
            Stage::Greeting,
        );
        assert!(matches!(err, Error::Timeout(_)));

        let err = Error::from_wire(
            mailloop_wire::Error::LineTooLong { limit: 8 },
            Stage::Command("RETR"),
        );
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Command("RETR"),
                ..
            }
        ));
    }
}
