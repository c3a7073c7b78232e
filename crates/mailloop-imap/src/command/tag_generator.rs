//! Command tags.

use crate::types::Tag;

/// Hands out the tags that pair each command with its completion.
///
/// Tags look like `A0000`, `A0001`, ... with at least four digits. Only
/// one command is ever outstanding, so the counter may wrap to zero.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: char,
    issued: u32,
}

impl TagGenerator {
    /// Creates a generator whose tags start with `prefix`.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { prefix, issued: 0 }
    }

    /// Issues the next tag.
    pub fn next(&mut self) -> Tag {
        let tag = Tag::new(format!("{}{:04}", self.prefix, self.issued));
        self.issued = self.issued.wrapping_add(1);
        tag
    }

    /// Number of tags issued so far, modulo 2^32.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.issued
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_tags() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next().as_str(), "A0000");
        assert_eq!(tags.next().as_str(), "A0001");
        assert_eq!(tags.issued(), 2);
    }

    #[test]
    fn test_prefix_and_width() {
        let mut tags = TagGenerator::new('X');
        let last = (0..=12_345).map(|_| tags.next()).last();
        assert_eq!(last.map(|t| t.to_string()).as_deref(), Some("X12345"));
    }

    #[test]
    fn test_counter_wraps() {
        let mut tags = TagGenerator { prefix: 'A', issued: u32::MAX };
        assert_eq!(tags.next().to_string(), format!("A{}", u32::MAX));
        assert_eq!(tags.next().as_str(), "A0000");
    }
}
