//! # mailloop-mime
//!
//! Encoding and decoding of the plain-text messages a mail round trip sends
//! and receives.
//!
//! ## Features
//!
//! - **Encoding**: [`encode`] renders an [`OutgoingMessage`] with RFC 5322
//!   headers, RFC 2047 subjects, CRLF line endings and dot-stuffing
//! - **Decoding**: [`decode`] (transfer form, e.g. POP3) and [`parse`]
//!   (stored form, e.g. IMAP) produce a [`FetchedMessage`]
//! - **Transfer encodings**: quoted-printable and base64 bodies, UTF-8 and
//!   ISO-8859-1 charsets
//! - **Dot-stuffing**: [`dot_stuff`] and [`dot_unstuff`] helpers
//!
//! Multipart bodies are not split into parts.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailloop_mime::{OutgoingMessage, decode, encode};
//!
//! let message = OutgoingMessage::new(
//!     "me@example.com",
//!     "me@example.com",
//!     "Test email subject: 42",
//!     "Test email text: 42",
//! );
//!
//! let wire = encode(&message);
//! let fetched = decode(&wire)?;
//! assert_eq!(fetched.subject, "Test email subject: 42");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod codec;
mod content_type;
pub mod encoding;
mod error;
mod header;
mod message;
mod stuffing;

pub use codec::{decode, encode, parse};
pub use content_type::ContentType;
pub use encoding::TransferEncoding;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{FetchedMessage, OutgoingMessage};
pub use stuffing::{dot_stuff, dot_unstuff, normalize_crlf};
