//! Encoding outgoing messages and decoding fetched ones.
//!
//! [`encode`] produces the *transfer form*: CRLF line endings and dot-stuffed,
//! ready to be written between SMTP `DATA` and the terminating `.` line.
//! [`decode`] accepts the same form (as POP3 `RETR` delivers it), while
//! [`parse`] takes a message as stored on the server (as IMAP delivers it).

use crate::content_type::ContentType;
use crate::encoding::{TransferEncoding, decode_charset, decode_rfc2047, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{FetchedMessage, OutgoingMessage};
use crate::stuffing::{dot_stuff, dot_unstuff, normalize_crlf};

/// How much of an unparseable message to quote in an error.
const FRAGMENT_LEN: usize = 80;

/// Renders a message in transfer form.
#[must_use]
pub fn encode(message: &OutgoingMessage) -> Vec<u8> {
    let mut headers = Headers::new();
    headers.add("From", single_line(message.from()));
    headers.add("To", single_line(message.to()));
    headers.add("Subject", encode_rfc2047(message.subject()));
    if let Some(date) = message.date() {
        headers.add("Date", date.to_rfc2822());
    }
    headers.add("MIME-Version", "1.0");
    headers.add("Content-Type", ContentType::text_plain().to_string());
    headers.add(
        "Content-Transfer-Encoding",
        TransferEncoding::EightBit.as_str(),
    );

    let mut raw = headers.to_string().into_bytes();
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(&normalize_crlf(message.body().as_bytes()));
    if !raw.ends_with(b"\r\n") {
        raw.extend_from_slice(b"\r\n");
    }

    dot_stuff(&raw)
}

/// Drops control characters so an address cannot start a new header line.
fn single_line(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

/// Decodes a message in transfer form.
///
/// # Errors
///
/// See [`parse`].
pub fn decode(raw: &[u8]) -> Result<FetchedMessage> {
    parse(&dot_unstuff(raw))
}

/// Parses a message as stored on the server.
///
/// Multipart bodies are returned undecoded.
///
/// # Errors
///
/// Returns an error if no blank line separates the headers from the body,
/// or if the body's transfer encoding or charset cannot be decoded.
pub fn parse(raw: &[u8]) -> Result<FetchedMessage> {
    let (header_bytes, body_bytes) = split_message(raw).ok_or_else(|| {
        let end = raw.len().min(FRAGMENT_LEN);
        Error::MissingSeparator {
            fragment: String::from_utf8_lossy(&raw[..end]).into_owned(),
        }
    })?;

    let headers = Headers::parse(&String::from_utf8_lossy(header_bytes));

    let subject = match headers.get("Subject") {
        Some(value) => decode_rfc2047(value)?,
        None => String::new(),
    };

    let content_type = headers
        .get("Content-Type")
        .map(ContentType::parse)
        .transpose()?;
    let transfer_encoding = headers
        .get("Content-Transfer-Encoding")
        .map(TransferEncoding::parse)
        .transpose()?
        .unwrap_or_default();

    let body = if content_type.as_ref().is_some_and(ContentType::is_multipart) {
        String::from_utf8_lossy(body_bytes).into_owned()
    } else {
        let charset = content_type
            .as_ref()
            .and_then(ContentType::charset)
            .unwrap_or("utf-8");
        decode_charset(transfer_encoding.decode(body_bytes)?, charset)?
    };

    Ok(FetchedMessage {
        subject,
        body: body.replace("\r\n", "\n").trim_end().to_string(),
        sequence: None,
    })
}

/// Splits at the first empty line, returning the header block and the body.
fn split_message(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut line_start = 0;
    loop {
        let rest = &raw[line_start..];
        if rest.starts_with(b"\r\n") {
            return Some((&raw[..line_start], &rest[2..]));
        }
        if rest.starts_with(b"\n") {
            return Some((&raw[..line_start], &rest[1..]));
        }
        let newline = rest.iter().position(|&b| b == b'\n')?;
        line_start += newline + 1;
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn probe() -> OutgoingMessage {
        OutgoingMessage::new(
            "user@example.com",
            "user@example.com",
            "Test email subject: 1700000000000",
            "Test email text: 1700000000000",
        )
    }

    #[test]
    fn test_encode_layout() {
        let raw = String::from_utf8(encode(&probe())).unwrap();
        assert_eq!(
            raw,
            concat!(
                "From: user@example.com\r\n",
                "To: user@example.com\r\n",
                "Subject: Test email subject: 1700000000000\r\n",
                "MIME-Version: 1.0\r\n",
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: 8bit\r\n",
                "\r\n",
                "Test email text: 1700000000000\r\n",
            )
        );
    }

    #[test]
    fn test_encode_date_header() {
        let date = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let raw = String::from_utf8(encode(&probe().with_date(date))).unwrap();
        assert!(raw.contains("\r\nDate: Tue, 14 Nov 2023 22:13:20 +0000\r\n"));
    }

    #[test]
    fn test_encode_normalizes_and_stuffs_body() {
        let msg = OutgoingMessage::new("a@x", "b@x", "s", "line one\n.\n.dot\rend");
        let raw = encode(&msg);
        let text = String::from_utf8(raw).unwrap();
        assert!(text.ends_with("\r\n\r\nline one\r\n..\r\n..dot\r\nend\r\n"));
        assert!(!text.contains("\r\n.\r\n"));
    }

    #[test]
    fn test_round_trip() {
        let decoded = decode(&encode(&probe())).unwrap();
        assert_eq!(decoded.subject, "Test email subject: 1700000000000");
        assert_eq!(decoded.body, "Test email text: 1700000000000");
        assert_eq!(decoded.sequence, None);
    }

    #[test]
    fn test_round_trip_non_ascii_subject() {
        let msg = OutgoingMessage::new("a@x", "b@x", "Grüße aus Köln ✓", "Körper\n");
        let raw = encode(&msg);
        assert!(raw.windows(10).any(|w| w == b"=?utf-8?B?"));
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.subject, "Grüße aus Köln ✓");
        assert_eq!(decoded.body, "Körper");
    }

    #[test]
    fn test_encode_strips_line_breaks_from_addresses() {
        let msg = OutgoingMessage::new("a@x\r\nBcc: c@x", "b@x\n", "s", "body");
        let text = String::from_utf8(encode(&msg)).unwrap();
        assert!(text.starts_with("From: a@xBcc: c@x\r\nTo: b@x\r\nSubject: s\r\n"));
        assert!(!text.contains("\r\nBcc:"));
    }

    #[test]
    fn test_round_trip_padded_subject() {
        let msg = OutgoingMessage::new("a@x", "a@x", "  padded subject ", "b");
        assert_eq!(decode(&encode(&msg)).unwrap().subject, "  padded subject ");
    }

    #[test]
    fn test_crlf_body_decodes_with_lf() {
        let msg = OutgoingMessage::new("a@x", "a@x", "s", "line one\r\nline two\r\n");
        assert_eq!(decode(&encode(&msg)).unwrap().body, "line one\nline two");
    }

    #[test]
    fn test_dot_line_survives() {
        let msg = OutgoingMessage::new("a@x", "b@x", "dots", "before\n.\nafter");
        let decoded = decode(&encode(&msg)).unwrap();
        assert_eq!(decoded.body, "before\n.\nafter");
    }

    #[test]
    fn test_parse_stored_form_keeps_leading_dots() {
        let raw = b"Subject: s\r\n\r\n..two\r\n";
        assert_eq!(parse(raw).unwrap().body, "..two");
        assert_eq!(decode(raw).unwrap().body, ".two");
    }

    #[test]
    fn test_parse_quoted_printable_body() {
        let raw = concat!(
            "Subject: =?ISO-8859-1?Q?caf=E9?=\r\n",
            "Content-Type: text/plain; charset=\"utf-8\"\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "Caf=C3=A9 au lait, a very long line that has been soft=\r\n",
            "-wrapped.\r\n",
            "\r\n"
        );
        let decoded = parse(raw.as_bytes()).unwrap();
        assert_eq!(decoded.subject, "café");
        assert_eq!(
            decoded.body,
            "Café au lait, a very long line that has been soft-wrapped."
        );
    }

    #[test]
    fn test_parse_base64_body() {
        let raw = concat!(
            "Subject: b64\n",
            "Content-Transfer-Encoding: base64\n",
            "\n",
            "VGVzdCBlbWFpbCB0ZXh0\n",
            "OiA0Mg==\n"
        );
        let decoded = parse(raw.as_bytes()).unwrap();
        assert_eq!(decoded.body, "Test email text: 42");
    }

    #[test]
    fn test_parse_latin1_body() {
        let mut raw = b"Subject: x\r\nContent-Type: text/plain; charset=iso-8859-1\r\n\r\n".to_vec();
        raw.extend_from_slice(&[b'n', 0xe9, b'\r', b'\n']);
        assert_eq!(parse(&raw).unwrap().body, "né");
    }

    #[test]
    fn test_parse_folded_subject() {
        let raw = b"Subject: Test email\r\n subject: 1\r\n\r\nbody\r\n";
        assert_eq!(parse(raw).unwrap().subject, "Test email subject: 1");
    }

    #[test]
    fn test_parse_without_subject() {
        let decoded = parse(b"From: a@x\r\n\r\nbody").unwrap();
        assert_eq!(decoded.subject, "");
        assert_eq!(decoded.body, "body");
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = parse(b"Subject: no body here\r\nFrom: a@x\r\n").unwrap_err();
        match err {
            Error::MissingSeparator { fragment } => {
                assert!(fragment.starts_with("Subject: no body here"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let raw = b"Subject: x\r\n\r\n\xff\xfe\r\n";
        assert!(matches!(parse(raw), Err(Error::Utf8Decode(_))));
    }

    #[test]
    fn test_parse_multipart_body_is_raw() {
        let raw = concat!(
            "Subject: parts\r\n",
            "Content-Type: multipart/alternative; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hi\r\n",
            "--b--\r\n"
        );
        let decoded = parse(raw.as_bytes()).unwrap();
        assert!(decoded.body.starts_with("--b\nContent-Type: text/plain"));
        assert!(decoded.body.ends_with("--b--"));
    }

    #[test]
    fn test_split_message_at_first_blank_line() {
        let (headers, body) = split_message(b"A: 1\r\n\r\nB: 2\r\n\r\nrest").unwrap();
        assert_eq!(headers, b"A: 1\r\n");
        assert_eq!(body, b"B: 2\r\n\r\nrest");
        assert!(split_message(b"A: 1\r\nB: 2").is_none());
        assert_eq!(split_message(b"\r\nonly body").unwrap().1, b"only body");
    }
}
