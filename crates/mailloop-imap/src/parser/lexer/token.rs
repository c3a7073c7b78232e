//! Lexer tokens.

/// One lexical unit of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `*`, opening an untagged response.
    Asterisk,
    /// `+`, opening a continuation request.
    Plus,
    /// A single space.
    Space,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Digits only.
    Number(u32),
    /// `NIL`, in any case.
    Nil,
    /// Any other run of atom characters, borrowed from the input.
    Atom(&'a str),
    /// A `"..."` string with escapes resolved.
    QuotedString(String),
    /// The bytes of a `{n}` literal.
    Literal(Vec<u8>),
    /// End of a line.
    Crlf,
    /// No input left.
    Eof,
}
