//! Property tests for the message codec.

#![allow(clippy::unwrap_used)]

use mailloop_mime::{OutgoingMessage, decode, dot_stuff, dot_unstuff, encode, parse};
use proptest::prelude::*;

/// A body line: printable ASCII, a lone dot, or a dot-led line.
fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,70}",
        Just(".".to_string()),
        "\\.[ -~]{0,20}",
    ]
}

fn body() -> impl Strategy<Value = String> {
    ("[!-~]", prop::collection::vec(body_line(), 0..8))
        .prop_map(|(first, rest)| {
            let mut lines = vec![first];
            lines.extend(rest);
            lines.join("\n")
        })
}

proptest! {
    #[test]
    fn ascii_round_trip(
        subject in "[ -~]{0,60}",
        body in body(),
    ) {
        let message = OutgoingMessage::new("probe@example.com", "probe@example.com", &subject, &body);
        let decoded = decode(&encode(&message)).unwrap();
        prop_assert_eq!(decoded.subject, subject);
        prop_assert_eq!(decoded.body, body.trim_end());
    }

    #[test]
    fn unicode_subject_round_trip(subject in "[^\\s\\p{C}]([^\\p{C}]{0,80}[^\\s\\p{C}])?") {
        let message = OutgoingMessage::new("a@example.com", "b@example.com", &subject, "x");
        let decoded = decode(&encode(&message)).unwrap();
        prop_assert_eq!(decoded.subject, subject);
    }

    #[test]
    fn stuffing_reverses(lines in prop::collection::vec(body_line(), 0..10)) {
        let text = lines.join("\r\n");
        prop_assert_eq!(dot_unstuff(&dot_stuff(text.as_bytes())), text.as_bytes());
    }

    #[test]
    fn transfer_form_has_no_terminator_line(body in body()) {
        let message = OutgoingMessage::new("a@example.com", "b@example.com", "s", &body);
        let wire = encode(&message);
        prop_assert!(wire.ends_with(b"\r\n"));
        for line in wire.split(|&b| b == b'\n') {
            prop_assert_ne!(line, b".\r".as_slice());
        }
    }

    #[test]
    fn stored_form_parses_like_transfer_form(body in body()) {
        let message = OutgoingMessage::new("a@example.com", "b@example.com", "s", &body);
        let wire = encode(&message);
        let stored = dot_unstuff(&wire);
        prop_assert_eq!(parse(&stored).unwrap(), decode(&wire).unwrap());
    }
}
