//! IMAP response parser.
//!
//! Parses server responses according to RFC 3501 grammar. Untagged data
//! this client has no use for is kept as [`UntaggedResponse::Other`]
//! rather than rejected.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::elidable_lifetime_names)]
#![allow(clippy::option_if_let_else)]

mod fetch;
mod helpers;
mod types;

pub use types::{Address, Envelope, FetchItem, UntaggedResponse};

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};

use helpers::{parse_capability_data, parse_flag_list, parse_response_code, read_text_until_crlf};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response, literals included.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer, input),
            Token::Plus => Ok(Self::parse_continuation(&mut lexer)),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(lexer.error(&format!("Expected *, +, or tag, got {token:?}"))),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag_str: &str) -> Result<Response> {
        lexer.expect_space()?;

        let status = Self::parse_status(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag_str),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>, input: &[u8]) -> Result<Response> {
        lexer.expect_space()?;
        let start = lexer.position();

        let untagged = match lexer.next_token()? {
            Token::Atom(s) => {
                let upper = s.to_uppercase();
                match upper.as_str() {
                    "OK" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::Ok { code, text }
                    }
                    "NO" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::No { code, text }
                    }
                    "BAD" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::Bad { code, text }
                    }
                    "PREAUTH" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::PreAuth { code, text }
                    }
                    "BYE" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::Bye { code, text }
                    }
                    "CAPABILITY" => UntaggedResponse::Capability(parse_capability_data(lexer)?),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Flags(parse_flag_list(lexer)?)
                    }
                    _ => Self::other(upper, input, start),
                }
            }
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?;
                let upper = keyword.to_uppercase();

                match upper.as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => UntaggedResponse::Expunge(
                        SeqNum::new(n).ok_or_else(|| lexer.error("Invalid sequence number 0"))?,
                    ),
                    "FETCH" => {
                        let seq =
                            SeqNum::new(n).ok_or_else(|| lexer.error("Invalid sequence number 0"))?;
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_response(lexer)?;
                        UntaggedResponse::Fetch { seq, items }
                    }
                    _ => Self::other(upper, input, start),
                }
            }
            token => {
                return Err(
                    lexer.error(&format!("Unexpected token in untagged response: {token:?}"))
                );
            }
        };

        Ok(Response::Untagged(untagged))
    }

    fn other(keyword: String, input: &[u8], start: usize) -> UntaggedResponse {
        let rest = input.get(start..).unwrap_or_default();
        let rest = rest.strip_suffix(b"\r\n").unwrap_or(rest);
        UntaggedResponse::Other {
            keyword,
            text: String::from_utf8_lossy(rest).into_owned(),
        }
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Response {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = read_text_until_crlf(lexer);

        Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        }
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(lexer.error(&format!("Invalid status: {s}"))),
        }
    }

    /// Parses `[SP [code] text]`; some servers send a bare status.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = read_text_until_crlf(lexer);

        Ok((code, text))
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
    use crate::Error;
    use crate::types::{Capability, Flag};

    use super::*;

    #[test]
    fn test_parse_ok_greeting() {
        let response = ResponseParser::parse(b"* OK IMAP4rev1 server ready\r\n").unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                assert!(code.is_none());
                assert_eq!(text, "IMAP4rev1 server ready");
            }
            _ => panic!("Expected untagged OK"),
        }
    }

    #[test]
    fn test_parse_tagged_ok() {
        let response = ResponseParser::parse(b"A0001 OK LOGIN completed\r\n").unwrap();

        assert_eq!(
            response,
            Response::Tagged {
                tag: Tag::new("A0001"),
                status: Status::Ok,
                code: None,
                text: "LOGIN completed".into(),
            }
        );
    }

    #[test]
    fn test_parse_tagged_with_code() {
        let response =
            ResponseParser::parse(b"A0002 OK [READ-ONLY] EXAMINE completed\r\n").unwrap();

        match response {
            Response::Tagged { status, code, .. } => {
                assert_eq!(status, Status::Ok);
                assert_eq!(code, Some(ResponseCode::ReadOnly));
            }
            _ => panic!("Expected tagged response"),
        }
    }

    #[test]
    fn test_parse_bare_tagged_status() {
        let response = ResponseParser::parse(b"A0003 OK\r\n").unwrap();
        assert!(matches!(response, Response::Tagged { ref text, .. } if text.is_empty()));
    }

    #[test]
    fn test_parse_capability() {
        let response =
            ResponseParser::parse(b"* CAPABILITY IMAP4rev1 IDLE AUTH=PLAIN\r\n").unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Capability(caps)) => {
                assert!(caps.contains(&Capability::Imap4Rev1));
                assert!(caps.contains(&Capability::Idle));
                assert!(caps.contains(&Capability::Auth("PLAIN".into())));
            }
            _ => panic!("Expected capability response"),
        }
    }

    #[test]
    fn test_parse_message_counts() {
        assert_eq!(
            ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Exists(23))
        );
        assert_eq!(
            ResponseParser::parse(b"* 0 RECENT\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Recent(0))
        );
        assert_eq!(
            ResponseParser::parse(b"* 4 EXPUNGE\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Expunge(SeqNum::new(4).unwrap()))
        );
    }

    #[test]
    fn test_expunge_zero_rejected() {
        assert!(matches!(
            ResponseParser::parse(b"* 0 EXPUNGE\r\n"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_flags() {
        let response =
            ResponseParser::parse(b"* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n")
                .unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Flags(flags)) => {
                assert!(flags.contains(&Flag::Seen));
                assert!(flags.contains(&Flag::Deleted));
                assert_eq!(flags.len(), 5);
            }
            _ => panic!("Expected FLAGS"),
        }
    }

    #[test]
    fn test_parse_continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ Ready for literal\r\n").unwrap(),
            Response::Continuation {
                text: Some("Ready for literal".to_string())
            }
        );
        assert_eq!(
            ResponseParser::parse(b"+\r\n").unwrap(),
            Response::Continuation { text: None }
        );
    }

    #[test]
    fn test_parse_response_code() {
        let response =
            ResponseParser::parse(b"* OK [UIDVALIDITY 1234567890] UIDs valid\r\n").unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                match code {
                    Some(ResponseCode::UidValidity(v)) => assert_eq!(v.get(), 1_234_567_890),
                    _ => panic!("Expected UIDVALIDITY code"),
                }
                assert_eq!(text, "UIDs valid");
            }
            _ => panic!("Expected untagged OK"),
        }
    }

    #[test]
    fn test_parse_fetch_with_literal() {
        let response = ResponseParser::parse(b"* 1 FETCH (BODY[] {11}\r\nHELLO WORLD)\r\n").unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Fetch { seq, items }) => {
                assert_eq!(seq.get(), 1);
                assert_eq!(
                    items,
                    vec![FetchItem::Body {
                        section: None,
                        origin: None,
                        data: Some(b"HELLO WORLD".to_vec()),
                    }]
                );
            }
            _ => panic!("Expected FETCH"),
        }
    }

    #[test]
    fn test_unknown_untagged_kept_as_other() {
        assert_eq!(
            ResponseParser::parse(b"* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Other {
                keyword: "LIST".into(),
                text: "LIST (\\HasNoChildren) \"/\" \"INBOX\"".into(),
            })
        );
        assert_eq!(
            ResponseParser::parse(b"* 5 XSTATE pending\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Other {
                keyword: "XSTATE".into(),
                text: "5 XSTATE pending".into(),
            })
        );
    }

    #[test]
    fn test_garbage_reports_position() {
        let err = ResponseParser::parse(b"(oops\r\n").unwrap_err();
        match err {
            Error::Parse {
                position, fragment, ..
            } => {
                assert_eq!(position, 1);
                assert!(fragment.contains("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
