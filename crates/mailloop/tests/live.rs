//! Round trips against a real Gmail account.
//!
//! Ignored by default. Put `MAILLOOP_USERNAME` and `MAILLOOP_PASSWORD` (an
//! app password) in the environment or a `.env` file, then run with
//! `--ignored`. Each test leaves the mailbox as it found it.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::Utc;
use mailloop::{AccountConfig, Prober, RetrievalKind};
use mailloop_wire::Credentials;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailloop=info")),
        )
        .with_test_writer()
        .try_init();
}

fn credentials() -> Credentials {
    dotenvy::dotenv().ok();
    let username = std::env::var("MAILLOOP_USERNAME").unwrap();
    let password = std::env::var("MAILLOOP_PASSWORD").unwrap();
    Credentials::new(username, password)
}

fn unique_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

async fn round_trip(kind: RetrievalKind) {
    init_tracing();
    let credentials = credentials();
    let prober = Prober::new(AccountConfig::gmail(kind).client_hostname("mailloop.local"));
    let id = unique_id();

    let message = mailloop::probe_message(credentials.username(), &id).with_date(Utc::now());
    prober.submit(&credentials, &message).await.unwrap();

    // Delivery to the own mailbox is not instantaneous.
    tokio::time::sleep(Duration::from_secs(5)).await;

    let received = prober.retrieve(&credentials).await.unwrap();
    mailloop::verify(&message, &received).unwrap();
}

#[tokio::test]
#[ignore = "talks to Gmail; needs MAILLOOP_USERNAME and MAILLOOP_PASSWORD"]
async fn test_gmail_imap_round_trip() {
    round_trip(RetrievalKind::Imap).await;
}

#[tokio::test]
#[ignore = "talks to Gmail; needs MAILLOOP_USERNAME and MAILLOOP_PASSWORD"]
async fn test_gmail_pop3_round_trip() {
    round_trip(RetrievalKind::Pop3).await;
}
