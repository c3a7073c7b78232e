//! # mailloop
//!
//! Checks that a mail account really delivers: sends a uniquely marked
//! message to itself over SMTP, reads the newest message back over IMAP or
//! POP3, deletes it, and verifies subject and body survived the trip.
//!
//! ## Features
//!
//! - **Presets**: Gmail submission with STARTTLS and implicit-TLS retrieval
//! - **Either retrieval protocol**: IMAP (`\Deleted` + CLOSE) or POP3
//!   (DELE + QUIT)
//! - **Transport generic steps**: every step runs against mock streams
//! - **Clear failures**: empty mailbox and field mismatches are distinct
//!   errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailloop::{AccountConfig, Prober, RetrievalKind};
//! use mailloop_wire::Credentials;
//!
//! let prober = Prober::new(AccountConfig::gmail(RetrievalKind::Imap));
//! let credentials = Credentials::new("me@gmail.com", "app-password");
//!
//! let id = chrono::Utc::now().timestamp_millis().to_string();
//! let report = prober.run(&credentials, &id).await?;
//! println!("{} in {:?}", report.subject, report.elapsed);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod probe;
pub mod prober;

pub use config::{AccountConfig, Retrieval, RetrievalKind, ServerConfig, ServerConfigBuilder};
pub use error::{Error, Result};
pub use probe::{
    RoundTripReport, probe_message, retrieve_latest_imap, retrieve_latest_pop3, submit, verify,
};
pub use prober::Prober;
