//! Error types for message encoding and decoding.

use std::string::FromUtf8Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Codec error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No blank line separates the header block from the body.
    #[error("missing header/body separator near {fragment:?}")]
    MissingSeparator {
        /// Start of the raw text that could not be split.
        fragment: String,
    },

    /// Invalid content type.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid or unsupported encoding.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}
