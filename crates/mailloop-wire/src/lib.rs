//! # mailloop-wire
//!
//! Transport plumbing shared by the mailloop SMTP, POP3 and IMAP sessions.
//!
//! ## Contents
//!
//! - [`FramedStream`]: CRLF line framing with byte-counted literal reads,
//!   bounded line/literal sizes and an optional per-read timeout
//! - [`MailStream`]: plaintext or rustls-encrypted TCP stream, upgradeable
//!   in place for STARTTLS
//! - [`Credentials`]: username/secret pair passed into session logins
//! - [`Stage`]: names the point of a session where a failure happened
//! - [`Security`] / [`Protocol`]: connection security modes and their
//!   conventional ports
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailloop_wire::{FramedStream, FramerConfig, Protocol, Security, connect};
//! use std::time::Duration;
//!
//! let stream = connect("pop.example.com", Security::Implicit.default_port(Protocol::Pop3),
//!     Security::Implicit, Duration::from_secs(30)).await?;
//! let mut framed = FramedStream::with_config(stream, FramerConfig::default());
//! let greeting = framed.read_line().await?;
//! framed.write_line(b"QUIT").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod credentials;
mod error;
mod framed;
mod security;
mod stage;
mod stream;

pub use credentials::Credentials;
pub use error::{Error, Result};
pub use framed::{FramedStream, FramerConfig};
pub use security::{Protocol, Security};
pub use stage::Stage;
pub use stream::{MailStream, connect, connect_plain, connect_tls, create_tls_connector};
