//! Command serialization helpers.
//!
//! A command that carries a synchronizing literal is split into parts:
//! every part but the last ends with `{n}\r\n`, and the client must see a
//! `+` continuation before it sends the next one.

use super::types::{FetchAttribute, FetchItems, StoreAction};

/// Accumulates the parts of one command.
#[derive(Debug, Default)]
pub struct Writer {
    parts: Vec<Vec<u8>>,
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn space(&mut self) {
        self.buf.push(b' ');
    }

    /// Writes `{n}` and starts a new part holding `data`.
    pub fn literal(&mut self, data: &[u8]) {
        self.buf
            .extend_from_slice(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.parts.push(std::mem::take(&mut self.buf));
        self.buf.extend_from_slice(data);
    }

    /// Writes an astring as an atom, a quoted string, or a literal.
    pub fn astring(&mut self, s: &str) {
        if !s.is_empty() && s.bytes().all(is_astring_char) {
            self.raw(s.as_bytes());
        } else if s.bytes().all(|b| (0x20..0x7f).contains(&b)) {
            self.buf.push(b'"');
            for b in s.bytes() {
                if b == b'"' || b == b'\\' {
                    self.buf.push(b'\\');
                }
                self.buf.push(b);
            }
            self.buf.push(b'"');
        } else {
            self.literal(s.as_bytes());
        }
    }

    /// Terminates the command with CRLF and returns its parts.
    pub fn finish(mut self) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(b"\r\n");
        self.parts.push(self.buf);
        self.parts
    }
}

/// Returns true if the byte may appear unquoted in an astring.
const fn is_astring_char(b: u8) -> bool {
    b > 0x20
        && b < 0x7f
        && !matches!(b, b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*')
}

/// Writes FETCH items.
pub fn write_fetch_items(w: &mut Writer, items: &FetchItems) {
    match items {
        FetchItems::All => w.raw(b"ALL"),
        FetchItems::Fast => w.raw(b"FAST"),
        FetchItems::Items(attrs) => {
            if let [attr] = attrs.as_slice() {
                write_fetch_attribute(w, attr);
            } else {
                w.raw(b"(");
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        w.space();
                    }
                    write_fetch_attribute(w, attr);
                }
                w.raw(b")");
            }
        }
    }
}

fn write_fetch_attribute(w: &mut Writer, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => w.raw(b"FLAGS"),
        FetchAttribute::InternalDate => w.raw(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => w.raw(b"RFC822.SIZE"),
        FetchAttribute::Envelope => w.raw(b"ENVELOPE"),
        FetchAttribute::Uid => w.raw(b"UID"),
        FetchAttribute::Rfc822 => w.raw(b"RFC822"),
        FetchAttribute::Body {
            section,
            peek,
            partial,
        } => {
            w.raw(if *peek { b"BODY.PEEK[" } else { b"BODY[" });
            if let Some(s) = section {
                w.raw(s.as_bytes());
            }
            w.raw(b"]");
            if let Some((start, len)) = partial {
                w.raw(format!("<{start}.{len}>").as_bytes());
            }
        }
    }
}

/// Writes a STORE action.
pub fn write_store_action(w: &mut Writer, action: &StoreAction) {
    w.raw(action.keyword().as_bytes());
    w.raw(b" (");
    for (i, flag) in action.flags().iter().enumerate() {
        if i > 0 {
            w.space();
        }
        w.raw(flag.as_str().as_bytes());
    }
    w.raw(b")");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn astring(s: &str) -> Vec<Vec<u8>> {
        let mut w = Writer::new();
        w.astring(s);
        w.finish()
    }

    #[test]
    fn test_atom() {
        assert_eq!(astring("probe@example.com"), vec![b"probe@example.com\r\n".to_vec()]);
    }

    #[test]
    fn test_quoted() {
        assert_eq!(astring("a b"), vec![b"\"a b\"\r\n".to_vec()]);
        assert_eq!(astring(""), vec![b"\"\"\r\n".to_vec()]);
        assert_eq!(astring("say \"hi\\\""), vec![b"\"say \\\"hi\\\\\\\"\"\r\n".to_vec()]);
    }

    #[test]
    fn test_literal_fallback() {
        assert_eq!(
            astring("pässword"),
            vec![b"{9}\r\n".to_vec(), "pässword\r\n".as_bytes().to_vec()]
        );
        assert_eq!(
            astring("two\r\nlines"),
            vec![b"{10}\r\n".to_vec(), b"two\r\nlines\r\n".to_vec()]
        );
    }
}
