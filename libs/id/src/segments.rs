//! The four segments of a customer identifier.
//!
//! Every segment is a small odometer wheel: `next` returns the advanced value
//! and whether the wheel wrapped around, which is the carry into the next
//! more significant segment.

use std::cmp::Ordering;
use std::fmt;

use crate::IdError;

// =============================================================================
// Prefix
// =============================================================================

/// Maximum number of letters in a prefix.
pub const MAX_PREFIX_LEN: usize = 3;

/// Most significant segment: 1-3 uppercase ASCII letters.
///
/// Prefixes order by length first, then lexicographically, so
/// `A < Z < AA < ZZ < AAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    letters: [u8; MAX_PREFIX_LEN],
    len: u8,
}

impl Prefix {
    /// The prefix of the first identifier ever issued.
    pub const FIRST: Self = Self {
        letters: [b'A', b'A', b'A'],
        len: 1,
    };

    /// The largest prefix the scheme can hold.
    pub const LAST: Self = Self {
        letters: [b'Z', b'Z', b'Z'],
        len: 3,
    };

    /// Parses a prefix segment.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let bytes = s.as_bytes();
        if bytes.is_empty()
            || bytes.len() > MAX_PREFIX_LEN
            || !bytes.iter().all(u8::is_ascii_uppercase)
        {
            return Err(IdError::InvalidPrefix {
                actual: s.to_string(),
            });
        }

        let mut letters = [b'A'; MAX_PREFIX_LEN];
        letters[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            letters,
            len: bytes.len() as u8,
        })
    }

    /// Returns the prefix as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored.
        std::str::from_utf8(&self.letters[..self.len()]).unwrap_or_default()
    }

    /// Number of letters in the prefix.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Advances the prefix as a base-26 odometer read right to left.
    ///
    /// An all-`Z` prefix shorter than three letters grows by one letter
    /// (`Z -> AA`, `ZZ -> AAA`). `ZZZ` wraps back to `AAA`; the returned flag
    /// is true only in that case.
    #[must_use]
    pub fn next(self) -> (Self, bool) {
        let mut letters = self.letters;
        let len = self.len();

        for i in (0..len).rev() {
            if letters[i] < b'Z' {
                letters[i] += 1;
                for letter in &mut letters[i + 1..len] {
                    *letter = b'A';
                }
                return (
                    Self {
                        letters,
                        len: self.len,
                    },
                    false,
                );
            }
        }

        if len < MAX_PREFIX_LEN {
            let grown = Self {
                letters: [b'A'; MAX_PREFIX_LEN],
                len: self.len + 1,
            };
            (grown, false)
        } else {
            let wrapped = Self {
                letters: [b'A'; MAX_PREFIX_LEN],
                len: MAX_PREFIX_LEN as u8,
            };
            (wrapped, true)
        }
    }
}

impl Ord for Prefix {
    fn cmp(&self, other: &Self) -> Ordering {
        self.len
            .cmp(&other.len)
            .then_with(|| self.as_str().cmp(other.as_str()))
    }
}

impl PartialOrd for Prefix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Block
// =============================================================================

/// Three-digit decimal segment, `000`-`999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block(u16);

impl Block {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(999);

    /// Creates a block, returning `None` above 999.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Parses a block segment.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_digits(s, 3)
            .map(Self)
            .ok_or_else(|| IdError::InvalidBlock {
                actual: s.to_string(),
            })
    }

    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Advances the block, wrapping `999 -> 000` with a carry.
    #[must_use]
    pub const fn next(self) -> (Self, bool) {
        if self.0 < Self::MAX.0 {
            (Self(self.0 + 1), false)
        } else {
            (Self::MIN, true)
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

// =============================================================================
// Letter
// =============================================================================

/// Single lowercase letter segment, `a`-`z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Letter(u8);

impl Letter {
    pub const MIN: Self = Self(b'a');
    pub const MAX: Self = Self(b'z');

    /// Creates a letter, returning `None` for anything outside `a`-`z`.
    #[must_use]
    pub const fn new(c: char) -> Option<Self> {
        if c.is_ascii_lowercase() {
            Some(Self(c as u8))
        } else {
            None
        }
    }

    /// Parses a letter segment.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        match s.as_bytes() {
            [b] if b.is_ascii_lowercase() => Ok(Self(*b)),
            _ => Err(IdError::InvalidLetter {
                actual: s.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn as_char(&self) -> char {
        self.0 as char
    }

    /// Advances the letter, wrapping `z -> a` with a carry.
    #[must_use]
    pub const fn next(self) -> (Self, bool) {
        if self.0 < Self::MAX.0 {
            (Self(self.0 + 1), false)
        } else {
            (Self::MIN, true)
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// =============================================================================
// Counter
// =============================================================================

/// Two-digit counter segment.
///
/// Parsing accepts `00` because the identifier grammar does; advancing never
/// produces it, so issued counters are always `01`-`99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(u8);

impl Counter {
    /// First counter value ever issued.
    pub const FIRST: Self = Self(1);
    pub const MAX: Self = Self(99);

    /// Creates a counter, returning `None` above 99.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Parses a counter segment.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_digits(s, 2)
            .map(|v| Self(v as u8))
            .ok_or_else(|| IdError::InvalidCounter {
                actual: s.to_string(),
            })
    }

    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Advances the counter, wrapping `99 -> 01` with a carry.
    #[must_use]
    pub const fn next(self) -> (Self, bool) {
        if self.0 < Self::MAX.0 {
            (Self(self.0 + 1), false)
        } else {
            (Self::FIRST, true)
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Parses exactly `width` ASCII digits.
fn parse_digits(s: &str, width: usize) -> Option<u16> {
    let bytes = s.as_bytes();
    if bytes.len() != width || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0')),
    )
}

// =============================================================================
// Tests
// =============================================================================
