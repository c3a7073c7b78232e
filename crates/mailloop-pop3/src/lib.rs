//! # mailloop-pop3
//!
//! A POP3 client (RFC 1939) for reading back messages a probe has sent.
//!
//! ## Features
//!
//! - **Checked state machine**: authorization, transaction, update; commands
//!   outside their state fail before anything is sent
//! - **Authentication**: USER/PASS and APOP
//! - **Retrieval**: STAT, RETR returning the transfer form, DELE/RSET
//! - **Safe deletion**: nothing marked with DELE is removed unless QUIT
//!   completes
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailloop_pop3::Pop3Session;
//! use mailloop_wire::{Credentials, Security, connect};
//! use std::time::Duration;
//!
//! let stream = connect("pop.gmail.com", 995, Security::Implicit, Duration::from_secs(30)).await?;
//! let mut session = Pop3Session::from_stream(stream).await?;
//! session.login(&Credentials::new("me@gmail.com", "app-password")).await?;
//!
//! let count = session.list_messages().await?;
//! let latest = session.fetch_message(count).await?;
//! println!("{}", latest.subject);
//!
//! session.quit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod error;
pub mod parser;

pub use connection::{MaildropStat, Pop3Session, SessionState, apop_digest};
pub use error::{Error, Result};
