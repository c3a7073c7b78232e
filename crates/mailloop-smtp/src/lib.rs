//! # mailloop-smtp
//!
//! An SMTP submission client (RFC 5321) that drives one message through a
//! server and reports exactly where it stopped.
//!
//! ## Features
//!
//! - **Checked state machine**: commands outside their state fail before
//!   anything is sent; any failure ends the session
//! - **Greeting**: EHLO with HELO fallback, extension discovery
//! - **TLS**: implicit TLS via `mailloop_wire::connect`, or STARTTLS on a
//!   [`mailloop_wire::MailStream`]
//! - **Authentication**: AUTH PLAIN and AUTH LOGIN
//! - **Errors**: transient (4xx) and permanent (5xx) replies are told apart
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailloop_smtp::{SmtpConfig, SmtpSession};
//! use mailloop_wire::{Credentials, Security, connect};
//! use std::time::Duration;
//!
//! let stream = connect("smtp.gmail.com", 587, Security::StartTls, Duration::from_secs(30)).await?;
//! let mut session = SmtpSession::new(stream, SmtpConfig::new("probe.local"));
//! session.greet().await?;
//! let mut session = session.starttls("smtp.gmail.com").await?;
//! session.authenticate(&Credentials::new("me@gmail.com", "app-password")).await?;
//!
//! session.begin_message("me@gmail.com").await?;
//! session.add_recipient("me@gmail.com").await?;
//! session.send(&mailloop_mime::encode(&message)).await?;
//! session.quit().await?;
//! ```
//!
//! ## Session States
//!
//! ```text
//! Connected ── greet() ──→ Greeted ── authenticate() ──→ Authenticated
//!                            │                               │
//!                            └──────── begin_message() ──────┘
//!                                           │
//!                                           ▼
//!                 MailStarted ── add_recipient() ──→ RecipientAdded
//!                                                        │
//!                              send() ── DataSending ────┘
//!                                │
//!                                └──→ Greeted / Authenticated
//!
//! quit() or any failure ──→ Done
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod error;
pub mod parser;
pub mod types;

pub use connection::{ServerInfo, SessionState, SmtpConfig, SmtpSession};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyClass, ReplyCode};
