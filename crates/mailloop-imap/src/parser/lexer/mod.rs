//! Tokenizer for server responses.
//!
//! Works on one complete response as assembled by the session reader:
//! every line with its CRLF and every literal's bytes in place.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// Bytes of context quoted on each side of a parse error.
const FRAGMENT_CONTEXT: usize = 24;

/// Cursor over one response.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Starts at the beginning of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the cursor.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Input not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Whether all input has been consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The byte under the cursor.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes one byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        if let Some(token) = punctuation(byte) {
            self.pos += 1;
            return Ok(token);
        }
        match byte {
            b'\r' if self.input.get(self.pos + 1) == Some(&b'\n') => {
                self.pos += 2;
                Ok(Token::Crlf)
            }
            b'\r' => Err(self.error("Expected LF after CR")),
            b'"' => self.quoted(),
            b'{' => self.literal(),
            _ if is_atom_char(byte) => self.word(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    fn quoted(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let mut text = Vec::new();

        loop {
            let byte = match self.advance() {
                None => return Err(self.error("Unexpected EOF in quoted string")),
                Some(b'"') => break,
                Some(b'\r' | b'\n') => return Err(self.error("Line break in quoted string")),
                Some(b'\\') => match self.advance() {
                    Some(escaped @ (b'"' | b'\\')) => escaped,
                    Some(other) => {
                        return Err(
                            self.error(&format!("Invalid escape: \\{}", char::from(other)))
                        );
                    }
                    None => return Err(self.error("Unexpected EOF in quoted string")),
                },
                Some(byte) => byte,
            };
            text.push(byte);
        }

        String::from_utf8(text)
            .map(Token::QuotedString)
            .map_err(|_| self.error("Invalid UTF-8 in quoted string"))
    }

    /// `{n}` or `{n+}`, the CRLF after it, then exactly `n` bytes.
    fn literal(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let digits_start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let size = std::str::from_utf8(&self.input[digits_start..self.pos])
            .ok()
            .and_then(|digits| digits.parse::<usize>().ok());

        if self.peek() == Some(b'+') {
            self.pos += 1;
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }
        let size = size.ok_or_else(|| self.error("Invalid literal size"))?;
        if !self.remaining().starts_with(b"\r\n") {
            return Err(self.error("Expected CRLF after literal size"));
        }
        self.pos += 2;

        let Some(data) = self.remaining().get(..size) else {
            return Err(self.error("Incomplete literal data"));
        };
        self.pos += size;
        Ok(Token::Literal(data.to_vec()))
    }

    /// An atom, `NIL`, or a number when every character is a digit.
    fn word(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.pos += 1;
        }
        let word = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))?;

        if word.bytes().all(|b| b.is_ascii_digit()) {
            word.parse()
                .map(Token::Number)
                .map_err(|_| self.error("Number too large"))
        } else if word.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(word))
        }
    }

    /// A parse error at the cursor, quoting the input around it.
    #[must_use]
    pub fn error(&self, message: &str) -> Error {
        let from = self.pos.saturating_sub(FRAGMENT_CONTEXT);
        let to = (self.pos + FRAGMENT_CONTEXT).min(self.input.len());
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
            fragment: String::from_utf8_lossy(&self.input[from..to]).into_owned(),
        }
    }

    /// Consumes a token of the same kind as `expected`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// `NIL`, a quoted string or a literal.
    pub fn read_nstring(&mut self) -> Result<Option<String>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::QuotedString(s) => Ok(Some(s)),
            Token::Literal(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|_| self.error("Invalid UTF-8 in literal")),
            token => Err(self.error(&format!("Expected nstring, got {token:?}"))),
        }
    }

    /// A number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("Expected number, got {token:?}"))),
        }
    }

    /// An atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }
}

const fn punctuation(byte: u8) -> Option<Token<'static>> {
    Some(match byte {
        b' ' => Token::Space,
        b'(' => Token::LParen,
        b')' => Token::RParen,
        b'[' => Token::LBracket,
        b']' => Token::RBracket,
        b'*' => Token::Asterisk,
        b'+' => Token::Plus,
        _ => return None,
    })
}

/// Whether `b` may appear in an atom.
///
/// `\` is allowed so flags like `\Seen` lex as one atom.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b, 0x21 | 0x23 | 0x24 | 0x26 | 0x27 | 0x2B..=0x5A | 0x5C | 0x5E..=0x7A | 0x7C | 0x7E)
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
    fn test_tagged_response() {
        let mut lexer = Lexer::new(b"A001 OK LOGIN completed\r\n");

        assert_eq!(lexer.next_token().unwrap(), Token::Atom("A001"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("OK"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("LOGIN"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("completed"));
        assert_eq!(lexer.next_token().unwrap(), Token::Crlf);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_numbers_and_atoms() {
        let mut lexer = Lexer::new(b"123 4a RFC822.SIZE");

        assert_eq!(lexer.next_token().unwrap(), Token::Number(123));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("4a"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("RFC822.SIZE"));
    }

    #[test]
    fn test_quoted_string_escaped() {
        let mut lexer = Lexer::new(b"\"hello \\\"world\\\"\"");

        assert_eq!(
            lexer.next_token().unwrap(),
            Token::QuotedString("hello \"world\"".to_string())
        );
    }

    #[test]
    fn test_nil() {
        let mut lexer = Lexer::new(b"NIL nil");

        assert_eq!(lexer.next_token().unwrap(), Token::Nil);
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Nil);
    }

    #[test]
    fn test_flag_list() {
        let mut lexer = Lexer::new(b"(\\Seen $Junk)");

        assert_eq!(lexer.next_token().unwrap(), Token::LParen);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("\\Seen"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("$Junk"));
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn test_literal_counts_bytes() {
        let mut lexer = Lexer::new(b"{11}\r\nHELLO\r\nWORLD)");

        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Literal(b"HELLO\r\nWORL".to_vec())
        );
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("D"));
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn test_non_synchronizing_literal() {
        let mut lexer = Lexer::new(b"{2+}\r\nhi");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"hi".to_vec()));
    }

    #[test]
    fn test_incomplete_literal() {
        let mut lexer = Lexer::new(b"{20}\r\nshort");
        let err = lexer.next_token().unwrap_err();
        match err {
            Error::Parse {
                position,
                message,
                fragment,
            } => {
                assert_eq!(position, 6);
                assert!(message.contains("Incomplete"));
                assert!(fragment.contains("short"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_carries_position_and_fragment() {
        let mut lexer = Lexer::new(b"* 1 FETCH \x01");
        for _ in 0..6 {
            lexer.next_token().unwrap();
        }
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::Parse { position: 10, ref fragment, .. } if fragment.starts_with("* 1 FETCH")));
    }

    #[test]
    fn test_is_atom_char() {
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b':'));
        assert!(is_atom_char(b'\\'));
        assert!(!is_atom_char(b' '));
        assert!(!is_atom_char(b'('));
        assert!(!is_atom_char(b'{'));
        assert!(!is_atom_char(b'"'));
        assert!(!is_atom_char(b'%'));
        assert!(!is_atom_char(b'*'));
        assert!(!is_atom_char(b']'));
        assert!(!is_atom_char(b'['));
    }
}
