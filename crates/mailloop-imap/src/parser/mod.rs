//! IMAP response parser.
//!
//! Sans-I/O: the session assembles one complete response (lines plus any
//! literals) and hands the bytes to [`ResponseParser::parse`].
//!
//! # Example
//!
//! ```
//! use mailloop_imap::parser::{ResponseParser, Response, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(3)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{Address, Envelope, FetchItem, Response, ResponseParser, UntaggedResponse};
