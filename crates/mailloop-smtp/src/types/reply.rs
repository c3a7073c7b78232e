//! Server replies.

use std::fmt;

/// A complete reply, continuation lines included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Code shared by every line.
    pub code: ReplyCode,
    /// Text of each line, code and separator stripped.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    pub const fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Whether the code is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// All lines joined with `\n`.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

/// What the first digit of a reply code says about the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// 2xx: done.
    Completed,
    /// 3xx: send more.
    Intermediate,
    /// 4xx: failed, may work later.
    Transient,
    /// 5xx: failed, will not work as sent.
    Permanent,
    /// Anything outside 200..=599.
    Invalid,
}

/// Three-digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// `220` greeting.
    pub const SERVICE_READY: Self = Self(220);
    /// `221` reply to QUIT.
    pub const CLOSING: Self = Self(221);
    /// `235` authentication accepted.
    pub const AUTH_SUCCESS: Self = Self(235);
    /// `250` requested action completed.
    pub const OK: Self = Self(250);
    /// `251` recipient not local, will forward.
    pub const FORWARD: Self = Self(251);
    /// `334` authentication challenge.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// `354` go ahead with message data.
    pub const START_DATA: Self = Self(354);
    /// `421` server shutting the channel.
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// `450` mailbox busy.
    pub const MAILBOX_BUSY: Self = Self(450);
    /// `535` credentials rejected.
    pub const AUTH_FAILED: Self = Self(535);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Classifies the code by its first digit.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completed,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Invalid,
        }
    }

    /// 2xx
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.class(), ReplyClass::Completed)
    }

    /// 3xx
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        matches!(self.class(), ReplyClass::Intermediate)
    }

    /// 4xx
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self.class(), ReplyClass::Transient)
    }

    /// 5xx
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self.class(), ReplyClass::Permanent)
    }

    /// 4xx or 5xx.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self.class(), ReplyClass::Transient | ReplyClass::Permanent)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
