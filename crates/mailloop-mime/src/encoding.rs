//! Transfer encodings, charsets and RFC 2047 encoded-words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Largest number of input bytes packed into one encoded-word.
///
/// 45 bytes become 60 base64 characters, which keeps each folded header
/// line under 78 characters.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded line breaks and spaces.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let compact: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Works on raw bytes so that 8-bit input passes through untouched.
///
/// # Errors
///
/// Returns an error if an `=` escape is truncated or not hexadecimal.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match data.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => {
                i += 3;
                continue;
            }
            Some([b'\n', ..]) => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let hex = data
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("incomplete escape sequence".to_string()))?;
        let value = std::str::from_utf8(hex)
            .ok()
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| {
                Error::InvalidEncoding(format!(
                    "invalid hex escape: ={}",
                    String::from_utf8_lossy(hex)
                ))
            })?;
        result.push(value);
        i += 3;
    }

    Ok(result)
}

/// `Content-Transfer-Encoding` of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII lines.
    #[default]
    SevenBit,
    /// 8-bit lines.
    EightBit,
    /// Arbitrary bytes.
    Binary,
    /// Quoted-Printable.
    QuotedPrintable,
    /// Base64.
    Base64,
}

impl TransferEncoding {
    /// Parses a `Content-Transfer-Encoding` header value.
    ///
    /// # Errors
    ///
    /// Returns an error for encodings other than the five standard ones.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "7bit" => Ok(Self::SevenBit),
            "8bit" => Ok(Self::EightBit),
            "binary" => Ok(Self::Binary),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            "base64" => Ok(Self::Base64),
            other => Err(Error::InvalidEncoding(format!(
                "unknown transfer encoding: {other}"
            ))),
        }
    }

    /// Returns the header spelling of this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }

    /// Reverses this encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid in this encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(data.to_vec()),
            Self::QuotedPrintable => decode_quoted_printable(data),
            Self::Base64 => decode_base64(data),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts bytes in `charset` to a string.
///
/// UTF-8 (and its ASCII subset) is decoded strictly. ISO-8859-1 maps each
/// byte to the code point of the same value.
///
/// # Errors
///
/// Returns an error for invalid UTF-8 or an unsupported charset.
pub fn decode_charset(data: Vec<u8>, charset: &str) -> Result<String> {
    match charset.trim().to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8(data).map_err(Into::into),
        "iso-8859-1" | "latin1" | "latin-1" => Ok(data.iter().map(|&b| char::from(b)).collect()),
        other => Err(Error::InvalidEncoding(format!("unsupported charset: {other}"))),
    }
}

/// Returns true if a header value has to be carried as encoded-words.
///
/// Leading or trailing whitespace counts too: header parsing trims it, an
/// encoded-word keeps it.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    text.contains("=?")
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}

/// Encodes a header value as UTF-8 base64 encoded-words when needed.
///
/// Long values are split on character boundaries into several words,
/// folded onto continuation lines.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        let next = idx + ch.len_utf8();
        if next - start > ENCODED_WORD_CHUNK && end > start {
            words.push(&text[start..end]);
            start = end;
        }
        end = next;
    }
    if end > start {
        words.push(&text[start..end]);
    }

    words
        .iter()
        .map(|word| format!("=?utf-8?B?{}?=", encode_base64(word.as_bytes())))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

/// Decodes RFC 2047 encoded-words inside a header value.
///
/// Whitespace between two adjacent encoded-words is dropped. Text that only
/// looks like the start of an encoded-word is kept as-is.
///
/// # Errors
///
/// Returns an error if an encoded-word has a bad payload or charset.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = "";
    let mut after_word = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            result.push_str(pending_space);
            result.push_str(rest);
            break;
        };

        let (before, candidate) = rest.split_at(start);
        let Some((decoded, consumed)) = decode_encoded_word(candidate)? else {
            result.push_str(pending_space);
            result.push_str(before);
            result.push_str("=?");
            pending_space = "";
            after_word = false;
            rest = &candidate[2..];
            continue;
        };

        if !(after_word && before.trim().is_empty()) {
            result.push_str(pending_space);
            result.push_str(before);
        }
        result.push_str(&decoded);
        pending_space = "";
        after_word = true;
        rest = &candidate[consumed..];

        // Defer trailing whitespace until we know whether another word follows.
        let trimmed = rest.trim_start();
        if trimmed.starts_with("=?") {
            pending_space = &rest[..rest.len() - trimmed.len()];
            rest = trimmed;
        }
    }

    Ok(result)
}

/// Decodes one `=?charset?enc?text?=` word at the start of `input`.
///
/// Returns the decoded text and the number of bytes consumed, or `None` when
/// `input` does not start with a well-formed encoded-word.
fn decode_encoded_word(input: &str) -> Result<Option<(String, usize)>> {
    let inner = &input[2..];
    let mut parts = inner.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(tail)) = (parts.next(), parts.next(), parts.next())
    else {
        return Ok(None);
    };
    let Some(close) = tail.find("?=") else {
        return Ok(None);
    };
    let payload = &tail[..close];
    if charset.is_empty() || payload.contains(char::is_whitespace) {
        return Ok(None);
    }

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + close + 2;
    let bytes = match encoding {
        "B" | "b" => decode_base64(payload.as_bytes())?,
        "Q" | "q" => decode_quoted_printable(payload.replace('_', " ").as_bytes())?,
        _ => return Ok(None),
    };

    // RFC 2231 language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);
    Ok(Some((decode_charset(bytes, charset)?, consumed)))
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

    #[test]
    fn test_base64_encode_decode() {
        let encoded = encode_base64(b"Hello, World!");
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64(encoded.as_bytes()).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_base64_ignores_line_breaks() {
        let decoded = decode_base64(b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello").unwrap(), b"Hello");
        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_keeps_raw_8bit() {
        let input = "Grüße =3D ok".as_bytes();
        let decoded = decode_quoted_printable(input).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Grüße = ok");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(
            decode_quoted_printable(b"Hello=\r\nWorld").unwrap(),
            b"HelloWorld"
        );
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld").unwrap(), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_bad_escape() {
        assert!(matches!(
            decode_quoted_printable(b"oops=Z1"),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            decode_quoted_printable(b"oops="),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(
            TransferEncoding::parse(" Quoted-Printable ").unwrap(),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("8BIT").unwrap(), TransferEncoding::EightBit);
        assert!(TransferEncoding::parse("x-uuencode").is_err());
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_decode_charset() {
        assert_eq!(decode_charset(b"abc".to_vec(), "US-ASCII").unwrap(), "abc");
        assert_eq!(decode_charset(vec![0x63, 0x61, 0x66, 0xe9], "iso-8859-1").unwrap(), "café");
        assert!(matches!(
            decode_charset(vec![0xff, 0xfe], "utf-8"),
            Err(Error::Utf8Decode(_))
        ));
        assert!(decode_charset(b"x".to_vec(), "koi8-r").is_err());
    }

    #[test]
    fn test_rfc2047_encode_plain_ascii() {
        assert_eq!(encode_rfc2047("Test email subject: 1"), "Test email subject: 1");
    }

    #[test]
    fn test_rfc2047_encode_non_ascii() {
        let encoded = encode_rfc2047("Héllo");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_encode_splits_long_values() {
        let text = "é".repeat(40);
        let encoded = encode_rfc2047(&text);
        assert!(encoded.contains("\r\n "));
        for word in encoded.split("\r\n ") {
            assert!(word.starts_with("=?utf-8?B?"));
            assert!(word.len() <= 75);
        }
        let unfolded = encoded.replace("\r\n", "");
        assert_eq!(decode_rfc2047(&unfolded).unwrap(), text);
    }

    #[test]
    fn test_rfc2047_encode_keeps_edge_whitespace() {
        assert!(needs_rfc2047("  padded "));
        assert!(!needs_rfc2047("inner  space"));
        let encoded = encode_rfc2047("  padded ");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert_eq!(decode_rfc2047(&encoded).unwrap(), "  padded ");
    }

    #[test]
    fn test_rfc2047_encode_escapes_lookalike() {
        let encoded = encode_rfc2047("literal =?x?= marker");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert_eq!(decode_rfc2047(&encoded).unwrap(), "literal =?x?= marker");
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?UTF-8?Q?H=C3=A9llo_there?=").unwrap(), "Héllo there");
    }

    #[test]
    fn test_rfc2047_decode_mixed_text() {
        let decoded = decode_rfc2047("Re: =?iso-8859-1?Q?caf=E9?= menu").unwrap();
        assert_eq!(decoded, "Re: café menu");
    }

    #[test]
    fn test_rfc2047_adjacent_words_join() {
        let decoded = decode_rfc2047("=?utf-8?B?SMOp?= \t =?utf-8?B?bGxv?=").unwrap();
        assert_eq!(decoded, "Héllo");
    }

    #[test]
    fn test_rfc2047_malformed_word_kept() {
        assert_eq!(decode_rfc2047("a =? b").unwrap(), "a =? b");
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?=").unwrap(), "=?utf-8?X?abc?=");
    }
}
