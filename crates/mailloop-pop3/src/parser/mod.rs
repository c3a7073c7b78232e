//! POP3 response parsing.

use crate::error::{Error, Result};

/// Status indicator of a single-line POP3 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// `+OK` with the remaining text.
    Ok(String),
    /// `-ERR` with the remaining text.
    Err(String),
}

/// Parses a status line.
///
/// # Errors
///
/// Returns an error if the line starts with neither `+OK` nor `-ERR`.
pub fn parse_status(line: &str) -> Result<Status> {
    if let Some(rest) = strip_keyword(line, "+OK") {
        Ok(Status::Ok(rest.to_string()))
    } else if let Some(rest) = strip_keyword(line, "-ERR") {
        Ok(Status::Err(rest.to_string()))
    } else {
        Err(Error::MalformedResponse(line.to_string()))
    }
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

/// Extracts the APOP timestamp (`<...>`) from a greeting text.
#[must_use]
pub fn apop_timestamp(greeting: &str) -> Option<&str> {
    let start = greeting.find('<')?;
    let len = greeting[start..].find('>')?;
    let stamp = &greeting[start..=start + len];
    stamp.contains('@').then_some(stamp)
}

/// Parses the `count size` text of a STAT reply.
///
/// # Errors
///
/// Returns an error if either number is missing or not decimal.
pub fn parse_stat(text: &str) -> Result<(u32, u64)> {
    let mut parts = text.split_whitespace();
    let count = parts.next().and_then(|s| s.parse().ok());
    let size = parts.next().and_then(|s| s.parse().ok());
    count
        .zip(size)
        .ok_or_else(|| Error::MalformedResponse(format!("+OK {text}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse_status("+OK POP3 server ready").unwrap(),
            Status::Ok("POP3 server ready".into())
        );
        assert_eq!(parse_status("+OK").unwrap(), Status::Ok(String::new()));
        assert_eq!(
            parse_status("-ERR no such message").unwrap(),
            Status::Err("no such message".into())
        );
        assert!(parse_status("+OKAY").is_err());
        assert!(parse_status("* OK imap").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn test_apop_timestamp() {
        assert_eq!(
            apop_timestamp("POP3 server ready <1896.697170952@dbc.mtview.ca.us>"),
            Some("<1896.697170952@dbc.mtview.ca.us>")
        );
        assert_eq!(apop_timestamp("Gpop ready for requests from 1.2.3.4"), None);
        assert_eq!(apop_timestamp("ready <notastamp>"), None);
    }

    #[test]
    fn test_parse_stat() {
        assert_eq!(parse_stat("2 320").unwrap(), (2, 320));
        assert_eq!(parse_stat("0 0").unwrap(), (0, 0));
        assert!(parse_stat("two 320").is_err());
        assert!(parse_stat("2").is_err());
    }
}
