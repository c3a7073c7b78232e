//! # mailloop-imap
//!
//! An IMAP4rev1 client (RFC 3501) for finding, reading and removing the
//! messages a probe has sent.
//!
//! ## Features
//!
//! - **Runtime state checks**: not authenticated, authenticated, selected,
//!   logout; commands outside their state fail before anything is sent
//! - **Literal-aware reader**: `{n}` switches the reader to byte-count mode
//!   for exactly `n` bytes, so message bodies are never split on CRLF
//! - **Tag attribution**: responses are matched to the command that asked
//!   for them; unrelated untagged data is buffered, not lost
//! - **Sans-I/O parser**: [`parser::ResponseParser`] works on byte slices
//!   and reports the position and fragment of malformed input
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailloop_imap::{Flag, ImapSession, SequenceSet};
//! use mailloop_wire::{Credentials, Security, connect};
//! use std::time::Duration;
//!
//! let stream = connect("imap.gmail.com", 993, Security::Implicit, Duration::from_secs(30)).await?;
//! let mut session = ImapSession::from_stream(stream).await?;
//! session.login(&Credentials::new("me@gmail.com", "app-password")).await?;
//!
//! let exists = session.select("INBOX").await?;
//! if let Some(latest) = session.fetch_latest().await? {
//!     println!("{}: {}", exists, latest.subject);
//!     let set = SequenceSet::single(exists).unwrap();
//!     session.store(&set, Flag::Deleted, true).await?;
//!     session.expunge().await?;
//! }
//!
//! session.logout().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, StoreAction, TagGenerator};
pub use connection::{ImapSession, SessionState};
pub use error::{Error, Result};
pub use fetch::MessageData;
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::{Capability, Flag, Flags, MailboxStatus, SeqNum, SequenceSet, Status, Uid};
