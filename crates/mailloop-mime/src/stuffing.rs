//! Line ending normalisation and dot-stuffing (RFC 5321 §4.5.2).
//!
//! SMTP `DATA` and POP3 multi-line responses both end at a line holding a
//! single `.`, so any data line that starts with `.` travels with one more
//! `.` in front of it.

/// Rewrites bare LF and bare CR line endings as CRLF.
#[must_use]
pub fn normalize_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut iter = data.iter().copied().peekable();

    while let Some(byte) = iter.next() {
        match byte {
            b'\r' => {
                out.extend_from_slice(b"\r\n");
                if iter.peek() == Some(&b'\n') {
                    iter.next();
                }
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            other => out.push(other),
        }
    }

    out
}

/// Prefixes every line that starts with `.` with one more `.`.
#[must_use]
pub fn dot_stuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 8);
    let mut line_start = true;

    for &byte in data {
        if line_start && byte == b'.' {
            out.push(b'.');
        }
        out.push(byte);
        line_start = byte == b'\n';
    }

    out
}

/// Removes the leading `.` from every line that starts with `.` and has
/// more characters after it.
#[must_use]
pub fn dot_unstuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut line_start = true;

    for (i, &byte) in data.iter().enumerate() {
        let skip = line_start
            && byte == b'.'
            && data
                .get(i + 1)
                .is_some_and(|&next| next != b'\r' && next != b'\n');
        if !skip {
            out.push(byte);
        }
        line_start = byte == b'\n';
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize_crlf(b"a\nb\r\nc\rd"), b"a\r\nb\r\nc\r\nd");
        assert_eq!(normalize_crlf(b"\r\n\r\n"), b"\r\n\r\n");
        assert_eq!(normalize_crlf(b""), b"");
    }

    #[test]
    fn test_dot_stuff() {
        assert_eq!(dot_stuff(b".\r\n"), b"..\r\n");
        assert_eq!(dot_stuff(b"a\r\n.b\r\n..c"), b"a\r\n..b\r\n...c");
        assert_eq!(dot_stuff(b"a.b\r\n"), b"a.b\r\n");
    }

    #[test]
    fn test_dot_unstuff() {
        assert_eq!(dot_unstuff(b"..\r\n"), b".\r\n");
        assert_eq!(dot_unstuff(b"a\r\n..b\r\n...c"), b"a\r\n.b\r\n..c");
        assert_eq!(dot_unstuff(b".\r\n"), b".\r\n");
        assert_eq!(dot_unstuff(b"x\n."), b"x\n.");
    }

    #[test]
    fn test_unstuff_reverses_stuff() {
        let text = b"Subject: x\r\n\r\n.\r\n..\r\n.hidden\r\nplain\r\n";
        assert_eq!(dot_unstuff(&dot_stuff(text)), text);
    }
}
