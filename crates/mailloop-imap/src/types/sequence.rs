//! Sequence sets for message ranges.

use super::SeqNum;

/// Sequence set naming the messages a command applies to.
///
/// `*` stands for the highest sequence number in the mailbox, so
/// membership can only be decided against a known message count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive, either order).
    Range(SeqNum, SeqNum),
    /// Range from start to end of mailbox.
    RangeFrom(SeqNum),
    /// The last message (`*`).
    Last,
    /// Every message (`1:*`).
    All,
    /// Several sets joined by commas.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a sequence set from a single number.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Creates a range sequence set.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }

    /// Returns true if `seq` falls inside the set for a mailbox holding
    /// `exists` messages.
    #[must_use]
    pub fn contains(&self, seq: SeqNum, exists: u32) -> bool {
        let n = seq.get();
        let last = exists.max(1);
        match self {
            Self::Single(s) => s.get() == n,
            Self::Range(a, b) => {
                let (lo, hi) = if a <= b { (a.get(), b.get()) } else { (b.get(), a.get()) };
                (lo..=hi).contains(&n)
            }
            Self::RangeFrom(start) => {
                let (lo, hi) = if start.get() <= last {
                    (start.get(), last)
                } else {
                    (last, start.get())
                };
                (lo..=hi).contains(&n)
            }
            Self::Last => n == last,
            Self::All => true,
            Self::Set(items) => items.iter().any(|item| item.contains(seq, exists)),
        }
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::Last => write!(f, "*"),
            Self::All => write!(f, "1:*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}
