//! Error types for the transport layer.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by framing and transport setup.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection failed, was refused, or closed mid-read.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// No data arrived within the configured deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A line grew past the configured maximum before its CRLF arrived.
    #[error("line too long: exceeds {limit} bytes")]
    LineTooLong {
        /// Configured maximum line length.
        limit: usize,
    },

    /// A literal announced more bytes than the configured maximum.
    #[error("literal too large: {size} bytes (max {limit})")]
    LiteralTooLarge {
        /// Announced literal size.
        size: usize,
        /// Configured maximum literal size.
        limit: usize,
    },
}

impl Error {
    /// Returns true if the peer violated a framing limit.
    ///
    /// Sessions report these as protocol errors rather than transport errors.
    #[must_use]
    pub const fn is_framing_violation(&self) -> bool {
        matches!(self, Self::LineTooLong { .. } | Self::LiteralTooLarge { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
