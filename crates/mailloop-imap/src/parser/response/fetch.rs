//! FETCH response parsing.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;

use super::helpers::parse_flag_list;
use super::types::{Address, Envelope, FetchItem};

/// Parses the parenthesised item list of a FETCH response.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                let upper = name.to_uppercase();
                match upper.as_str() {
                    "FLAGS" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Flags(parse_flag_list(lexer)?));
                    }
                    "UID" => {
                        lexer.expect_space()?;
                        let n = lexer.read_number()?;
                        let uid = Uid::new(n).ok_or_else(|| {
                            lexer.error(&format!("invalid UID value: {n} (UID cannot be 0)"))
                        })?;
                        items.push(FetchItem::Uid(uid));
                    }
                    "RFC822.SIZE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Rfc822Size(lexer.read_number()?));
                    }
                    "INTERNALDATE" => {
                        lexer.expect_space()?;
                        if let Some(date) = lexer.read_nstring()? {
                            items.push(FetchItem::InternalDate(date));
                        }
                    }
                    "ENVELOPE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Envelope(Box::new(parse_envelope(lexer)?)));
                    }
                    "BODY" if lexer.peek() == Some(b'[') => {
                        let (section, origin) = parse_body_section_and_origin(lexer)?;
                        items.push(parse_body_data(lexer, section, origin)?);
                    }
                    "RFC822" => items.push(parse_body_data(lexer, None, None)?),
                    "RFC822.HEADER" => {
                        items.push(parse_body_data(lexer, Some("HEADER".into()), None)?);
                    }
                    "RFC822.TEXT" => {
                        items.push(parse_body_data(lexer, Some("TEXT".into()), None)?);
                    }
                    _ => skip_fetch_item(lexer)?,
                }
            }
            token => {
                return Err(lexer.error(&format!("Unexpected token in FETCH: {token:?}")));
            }
        }
    }

    Ok(items)
}

/// Reads the ` nstring` value after a body item name.
fn parse_body_data(
    lexer: &mut Lexer<'_>,
    section: Option<String>,
    origin: Option<u32>,
) -> Result<FetchItem> {
    lexer.expect_space()?;
    let data = match lexer.next_token()? {
        Token::Literal(d) => Some(d),
        Token::QuotedString(s) => Some(s.into_bytes()),
        Token::Nil => None,
        token => return Err(lexer.error(&format!("Expected body data, got {token:?}"))),
    };

    Ok(FetchItem::Body {
        section,
        origin,
        data,
    })
}

/// Parses `[section]` and an optional `<origin>` after `BODY`.
fn parse_body_section_and_origin(lexer: &mut Lexer<'_>) -> Result<(Option<String>, Option<u32>)> {
    let mut section = None;
    let mut origin = None;

    if lexer.peek() == Some(b'[') {
        lexer.advance();

        let mut section_buf = String::new();
        loop {
            match lexer.advance() {
                Some(b']') => break,
                Some(b) => section_buf.push(char::from(b)),
                None => return Err(lexer.error("Unterminated body section")),
            }
        }

        if !section_buf.is_empty() {
            section = Some(section_buf);
        }
    }

    if lexer.peek() == Some(b'<') {
        lexer.advance();

        let mut origin_buf = String::new();
        loop {
            match lexer.advance() {
                Some(b'>') => break,
                Some(b) if b.is_ascii_digit() => origin_buf.push(char::from(b)),
                _ => return Err(lexer.error("Malformed body origin")),
            }
        }

        origin = origin_buf.parse().ok();
    }

    Ok((section, origin))
}

/// Parses an envelope structure.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;

    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;

    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;

    let message_id = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// Parses an address list.
fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();

            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => addresses.push(parse_address(lexer)?),
                    Some(b' ') => {
                        lexer.advance();
                    }
                    _ => return Err(lexer.error("Malformed address list")),
                }
            }

            Ok(addresses)
        }
        token => Err(lexer.error(&format!("Expected address list, got {token:?}"))),
    }
}

fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;

    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;

    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;

    let host = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Address {
        name,
        adl,
        mailbox,
        host,
    })
}

/// Skips the value of an item this parser does not model.
///
/// Walks tokens, so literals and quoted strings holding parentheses are
/// skipped whole.
fn skip_fetch_item(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek() == Some(b'[') {
        parse_body_section_and_origin(lexer)?;
    }
    lexer.expect_space()?;

    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => depth -= 1,
            token @ (Token::RParen | Token::Crlf | Token::Eof) => {
                return Err(lexer.error(&format!("Unexpected {token:?} in FETCH item")));
            }
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
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
    use crate::Error;

    #[test]
    fn test_parse_fetch_uid_and_flags() {
        let mut lexer = Lexer::new(b"(UID 123 FLAGS (\\Seen))");
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], FetchItem::Uid(uid) if uid.get() == 123));
        assert!(matches!(&items[1], FetchItem::Flags(f) if f.is_seen()));
    }

    #[test]
    fn test_parse_fetch_uid_zero_rejected() {
        let mut lexer = Lexer::new(b"(UID 0)");
        let err = parse_fetch_response(&mut lexer).unwrap_err();
        assert!(matches!(err, Error::Parse { ref message, .. } if message.contains("UID")));
    }

    #[test]
    fn test_parse_body_literal() {
        let mut lexer = Lexer::new(b"(BODY[] {11}\r\nHELLO WORLD)");
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: None,
                origin: None,
                data: Some(b"HELLO WORLD".to_vec()),
            }]
        );
    }

    #[test]
    fn test_parse_body_text_with_origin() {
        let mut lexer = Lexer::new(b"(BODY[TEXT]<100> \"abc\")");
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: Some("TEXT".into()),
                origin: Some(100),
                data: Some(b"abc".to_vec()),
            }]
        );
    }

    #[test]
    fn test_rfc822_forms_map_to_sections() {
        let mut lexer = Lexer::new(b"(RFC822 {2}\r\nhi RFC822.TEXT NIL)");
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert!(matches!(&items[0], FetchItem::Body { section: None, data: Some(d), .. } if d == b"hi"));
        assert!(matches!(&items[1], FetchItem::Body { section: Some(s), data: None, .. } if s == "TEXT"));
    }

    #[test]
    fn test_unknown_items_are_skipped() {
        let mut lexer = Lexer::new(
            b"(X-GM-LABELS (\"(weird)\" \\Inbox) MODSEQ (12345) BINARY[1] {3}\r\nabc RFC822.SIZE 42)",
        );
        let items = parse_fetch_response(&mut lexer).unwrap();
        assert_eq!(items, vec![FetchItem::Rfc822Size(42)]);
    }

    #[test]
    fn test_parse_envelope() {
        let data = b"(\"Tue, 14 Nov 2023 22:13:20 +0000\" \"Test email subject: 1700000000000\" ((NIL NIL \"probe\" \"example.com\")) NIL NIL ((\"Probe\" NIL \"probe\" \"example.com\")) NIL NIL NIL \"<id@example.com>\")";
        let mut lexer = Lexer::new(data);
        let envelope = parse_envelope(&mut lexer).unwrap();

        assert_eq!(
            envelope.subject.as_deref(),
            Some("Test email subject: 1700000000000")
        );
        assert_eq!(
            envelope.from[0].email().as_deref(),
            Some("probe@example.com")
        );
        assert_eq!(envelope.to[0].name.as_deref(), Some("Probe"));
        assert!(envelope.sender.is_empty());
        assert_eq!(envelope.message_id.as_deref(), Some("<id@example.com>"));
    }
}
