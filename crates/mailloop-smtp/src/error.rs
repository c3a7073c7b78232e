//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

use mailloop_wire::Stage;

use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection failed or closed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The server did not answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// STARTTLS negotiation failed.
    #[error("TLS negotiation failed: {0}")]
    Tls(#[source] mailloop_wire::Error),

    /// The server answered with an unexpected reply, or the command is not
    /// valid in the session's current state.
    #[error("protocol error during {stage}: {}", describe(.code, .text))]
    Protocol {
        /// Where the failure happened.
        stage: Stage,
        /// Reply code, if the server sent one.
        code: Option<ReplyCode>,
        /// Reply text or a description of the violation.
        text: String,
    },

    /// The server rejected the credentials.
    #[error("authentication failed: {code} {text}")]
    Auth {
        /// Reply code (e.g., 535).
        code: ReplyCode,
        /// Reply text.
        text: String,
    },

    /// A reply line could not be parsed.
    #[error("malformed reply line: {0:?}")]
    MalformedReply(String),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Feature not advertised by the server.
    #[error("server does not support {0}")]
    NotSupported(&'static str),
}

#[allow(clippy::ref_option)]
fn describe(code: &Option<ReplyCode>, text: &str) -> String {
    code.map_or_else(|| text.to_string(), |code| format!("{code} {text}"))
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
            e @ mailloop_wire::Error::InvalidDnsName(_) => Self::Tls(e),
            e => Self::Protocol {
                stage,
                code: None,
                text: e.to_string(),
            },
        }
    }

    /// Creates a protocol error from an unexpected reply.
    #[must_use]
    pub fn unexpected(stage: Stage, code: ReplyCode, text: impl Into<String>) -> Self {
        Self::Protocol {
            stage,
            code: Some(code),
            text: text.into(),
        }
    }

    /// Returns the server reply code carried by this error, if any.
    #[must_use]
    pub const fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Self::Protocol { code, .. } => *code,
            Self::Auth { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.reply_code().is_some_and(ReplyCode::is_permanent)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.reply_code().is_some_and(ReplyCode::is_transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let busy = Error::unexpected(Stage::Command("RCPT TO"), ReplyCode::new(450), "busy");
        assert!(busy.is_transient());
        assert!(!busy.is_permanent());

        let denied = Error::Auth {
            code: ReplyCode::AUTH_FAILED,
            text: "bad credentials".into(),
        };
        assert!(denied.is_permanent());

        let closed = Error::Transport(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(!closed.is_permanent());
        assert!(!closed.is_transient());
    }

    #[test]
    fn test_display() {
        let err = Error::unexpected(Stage::Command("MAIL FROM"), ReplyCode::new(550), "no");
        assert_eq!(err.to_string(), "protocol error during MAIL FROM: 550 no");

        let err = Error::Protocol {
            stage: Stage::Greeting,
            code: None,
            text: "session is done".into(),
        };
        assert_eq!(err.to_string(), "protocol error during greeting: session is done");
    }

    #[test]
    fn test_framing_violation_is_protocol_error() {
        let err = Error::from_wire(
            mailloop_wire::Error::LineTooLong { limit: 10 },
            Stage::Greeting,
        );
        assert!(matches!(err, Error::Protocol { code: None, .. }));
    }
}
