//! Customer identifiers and the sequencer that issues them.
//!
//! A customer identifier is a mixed-radix counter rendered as
//! `{prefix}-{block}{letter}{counter}`, e.g. `A-000a01`. Advancing it bumps
//! the counter and carries into the letter, then the block, then the prefix.

use std::fmt;
use std::str::FromStr;

use crate::segments::{Block, Counter, Letter, Prefix};
use crate::IdError;

/// Which segment absorbed the carry when advancing an identifier.
///
/// Variants are ordered by significance, so `rollover >= Rollover::Block`
/// means the block (or something more significant) changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rollover {
    /// Only the counter moved.
    None,
    /// Counter wrapped; letter advanced.
    Letter,
    /// Letter wrapped; block advanced.
    Block,
    /// Block wrapped; prefix advanced.
    Prefix,
    /// `ZZZ-999z99` wrapped back to `AAA-000a01`.
    Wrapped,
}

/// A parsed customer identifier.
///
/// Values are only built through [`CustomerId::parse`], the segment
/// constructors, or by advancing an existing identifier, so every value
/// renders to a string matching `^[A-Z]{1,3}-\d{3}[a-z]\d{2}$`.
///
/// Ordering follows segment significance: prefix, block, letter, counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomerId {
    prefix: Prefix,
    block: Block,
    letter: Letter,
    counter: Counter,
}

impl CustomerId {
    /// The identifier issued when no predecessor exists: `A-000a01`.
    pub const FIRST: Self = Self {
        prefix: Prefix::FIRST,
        block: Block::MIN,
        letter: Letter::MIN,
        counter: Counter::FIRST,
    };

    /// The last identifier before the sequence wraps: `ZZZ-999z99`.
    pub const LAST: Self = Self {
        prefix: Prefix::LAST,
        block: Block::MAX,
        letter: Letter::MAX,
        counter: Counter::MAX,
    };

    /// Builds an identifier from its segments.
    #[must_use]
    pub const fn from_segments(
        prefix: Prefix,
        block: Block,
        letter: Letter,
        counter: Counter,
    ) -> Self {
        Self {
            prefix,
            block,
            letter,
            counter,
        }
    }

    /// Parses an identifier from its canonical string form.
    ///
    /// The whole string must match; there is no trimming and no case folding.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let Some((prefix, body)) = s.split_once('-') else {
            return Err(IdError::MissingSeparator);
        };

        let prefix = Prefix::parse(prefix)?;

        // Byte offsets below are only valid on ASCII; anything else cannot
        // be a well-formed body anyway.
        if !body.is_ascii() || body.len() < 3 {
            return Err(IdError::InvalidBlock {
                actual: body.to_string(),
            });
        }
        let (block, rest) = body.split_at(3);
        let block = Block::parse(block)?;

        if rest.is_empty() {
            return Err(IdError::InvalidLetter {
                actual: String::new(),
            });
        }
        let (letter, counter) = rest.split_at(1);
        let letter = Letter::parse(letter)?;
        let counter = Counter::parse(counter)?;

        Ok(Self {
            prefix,
            block,
            letter,
            counter,
        })
    }

    #[must_use]
    pub const fn prefix(&self) -> Prefix {
        self.prefix
    }

    #[must_use]
    pub const fn block(&self) -> Block {
        self.block
    }

    #[must_use]
    pub const fn letter(&self) -> Letter {
        self.letter
    }

    #[must_use]
    pub const fn counter(&self) -> Counter {
        self.counter
    }

    /// Returns true for `ZZZ-999z99`, whose successor wraps around.
    #[must_use]
    pub fn is_last(&self) -> bool {
        *self == Self::LAST
    }

    /// Returns the identifier that follows this one.
    #[must_use]
    pub fn next(&self) -> Self {
        self.next_with_rollover().0
    }

    /// Returns the following identifier together with the most significant
    /// segment that changed.
    #[must_use]
    pub fn next_with_rollover(&self) -> (Self, Rollover) {
        let mut next = *self;

        let (counter, carry) = self.counter.next();
        next.counter = counter;
        if !carry {
            return (next, Rollover::None);
        }

        let (letter, carry) = self.letter.next();
        next.letter = letter;
        if !carry {
            return (next, Rollover::Letter);
        }

        let (block, carry) = self.block.next();
        next.block = block;
        if !carry {
            return (next, Rollover::Block);
        }

        let (prefix, wrapped) = self.prefix.next();
        next.prefix = prefix;
        if wrapped {
            (next, Rollover::Wrapped)
        } else {
            (next, Rollover::Prefix)
        }
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}{}{}",
            self.prefix, self.block, self.letter, self.counter
        )
    }
}

impl FromStr for CustomerId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for CustomerId {
    type Error = IdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl serde::Serialize for CustomerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for CustomerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Sequencer entry points
// =============================================================================

/// Computes the identifier to issue after `previous`.
///
/// `None` or an empty string means nothing has been issued yet and yields
/// [`CustomerId::FIRST`]. A malformed predecessor is an error rather than a
/// best-effort guess.
pub fn next_customer_id(previous: Option<&str>) -> Result<CustomerId, IdError> {
    match previous {
        None | Some("") => Ok(CustomerId::FIRST),
        Some(prev) => Ok(CustomerId::parse(prev)?.next()),
    }
}

/// Returns true iff `s` is a well-formed customer identifier.
///
/// This checks shape only; a counter of `00` is accepted even though the
/// sequencer never issues one.
pub fn validate_customer_id(s: &str) -> bool {
    CustomerId::parse(s).is_ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn id(s: &str) -> CustomerId {
        CustomerId::parse(s).unwrap()
    }

    #[test]
    fn test_first_when_absent() {
        assert_eq!(next_customer_id(None).unwrap().to_string(), "A-000a01");
        assert_eq!(next_customer_id(Some("")).unwrap(), CustomerId::FIRST);
    }

    #[rstest]
    #[case("A-000a01", "A-000a02")]
    #[case("A-000a09", "A-000a10")]
    #[case("A-000a99", "A-000b01")]
    #[case("A-000z99", "A-001a01")]
    #[case("A-009z99", "A-010a01")]
    #[case("A-999z99", "B-000a01")]
    #[case("Z-999z99", "AA-000a01")]
    #[case("AZ-999z99", "BA-000a01")]
    #[case("ZZ-999z99", "AAA-000a01")]
    #[case("ABZ-999z99", "ACA-000a01")]
    #[case("ZZZ-999z99", "AAA-000a01")]
    #[case("A-000a00", "A-000a01")]
    fn test_next_boundaries(#[case] previous: &str, #[case] expected: &str) {
        let next = next_customer_id(Some(previous)).unwrap();
        assert_eq!(next.to_string(), expected);
    }

    #[rstest]
    #[case("A-000a01", Rollover::None)]
    #[case("A-000a99", Rollover::Letter)]
    #[case("A-000z99", Rollover::Block)]
    #[case("A-999z99", Rollover::Prefix)]
    #[case("Z-999z99", Rollover::Prefix)]
    #[case("ZZZ-999z99", Rollover::Wrapped)]
    fn test_rollover_reports_carried_segment(#[case] previous: &str, #[case] expected: Rollover) {
        assert_eq!(id(previous).next_with_rollover().1, expected);
    }

    #[test]
    fn test_last_wraps_to_aaa() {
        assert!(CustomerId::LAST.is_last());
        assert_eq!(CustomerId::LAST.to_string(), "ZZZ-999z99");
        assert_eq!(CustomerId::LAST.next(), id("AAA-000a01"));
    }

    #[rstest]
    #[case("", IdError::Empty)]
    #[case("A000a01", IdError::MissingSeparator)]
    #[case("a-000a01", IdError::InvalidPrefix { actual: "a".into() })]
    #[case("ABCD-000a01", IdError::InvalidPrefix { actual: "ABCD".into() })]
    #[case("-000a01", IdError::InvalidPrefix { actual: "".into() })]
    #[case("A-00a01", IdError::InvalidBlock { actual: "00a".into() })]
    #[case("A-0", IdError::InvalidBlock { actual: "0".into() })]
    #[case("A-000", IdError::InvalidLetter { actual: "".into() })]
    #[case("A-000A01", IdError::InvalidLetter { actual: "A".into() })]
    #[case("A-000a1", IdError::InvalidCounter { actual: "1".into() })]
    #[case("A-000a011", IdError::InvalidCounter { actual: "011".into() })]
    #[case("A-000a0x", IdError::InvalidCounter { actual: "0x".into() })]
    fn test_parse_errors(#[case] input: &str, #[case] expected: IdError) {
        assert_eq!(CustomerId::parse(input).unwrap_err(), expected);
    }

    #[rstest]
    #[case("", "empty")]
    #[case("A000a01", "missing_separator")]
    #[case("ABCD-000a01", "invalid_prefix")]
    #[case("A-00a01", "invalid_block")]
    #[case("A-000A01", "invalid_letter")]
    #[case("A-000a0x", "invalid_counter")]
    fn test_error_codes(#[case] input: &str, #[case] code: &str) {
        assert_eq!(CustomerId::parse(input).unwrap_err().code(), code);
    }

    #[test]
    fn test_next_rejects_malformed_previous() {
        let err = next_customer_id(Some("AB-12a3")).unwrap_err();
        assert!(matches!(err, IdError::InvalidBlock { .. }));
        assert!(next_customer_id(Some(" A-000a01")).is_err());
    }

    #[rstest]
    #[case("A-000a01")]
    #[case("ZZZ-999z99")]
    #[case("QR-123m45")]
    #[case("A-000a00")]
    fn test_validate_accepts(#[case] input: &str) {
        assert!(validate_customer_id(input));
    }

    #[rstest]
    #[case("AB-12a3")]
    #[case("a-000A01")]
    #[case("A-000a01 ")]
    #[case(" A-000a01")]
    #[case("A_000a01")]
    #[case("A--000a01")]
    #[case("A-000a01-")]
    #[case("A-０００a01")]
    #[case("A-000é01")]
    #[case("")]
    fn test_validate_rejects(#[case] input: &str) {
        assert!(!validate_customer_id(input));
    }

    #[test]
    fn test_json_roundtrip() {
        let value = id("BC-042q17");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"BC-042q17\"");
        let parsed: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_json_rejects_malformed() {
        let result: Result<CustomerId, _> = serde_json::from_str("\"not-an-id\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_ninety_nine_steps_advance_letter() {
        let mut current = id("X-000a01");
        for _ in 0..98 {
            current = current.next();
        }
        assert_eq!(current, id("X-000a99"));
        assert_eq!(current.next(), id("X-000b01"));
    }

    #[test]
    fn test_full_block_cycle_advances_block() {
        let start = id("X-000a01");
        let mut current = start;
        let mut rollovers = Vec::new();
        for _ in 0..(26 * 99) {
            let (next, rollover) = current.next_with_rollover();
            if rollover != Rollover::None {
                rollovers.push(rollover);
            }
            current = next;
        }
        assert_eq!(current, id("X-001a01"));
        // 25 letter advances, then one block advance.
        assert_eq!(rollovers.len(), 26);
        assert_eq!(rollovers.last(), Some(&Rollover::Block));
        assert!(rollovers[..25].iter().all(|r| *r == Rollover::Letter));
    }

    #[test]
    fn test_walk_is_strictly_increasing() {
        let mut current = id("Y-998y50");
        for _ in 0..20_000 {
            let next = current.next();
            assert!(next > current, "{next} not after {current}");
            current = next;
        }
    }

    fn arb_customer_id() -> impl Strategy<Value = String> {
        (
            "[A-Z]{1,3}",
            0u16..=999,
            proptest::char::range('a', 'z'),
            0u8..=99,
        )
            .prop_map(|(prefix, block, letter, counter)| {
                format!("{prefix}-{block:03}{letter}{counter:02}")
            })
    }

    proptest! {
        #[test]
        fn prop_generated_ids_validate(s in arb_customer_id()) {
            prop_assert!(validate_customer_id(&s));
            prop_assert_eq!(CustomerId::parse(&s).unwrap().to_string(), s);
        }

        #[test]
        fn prop_validate_agrees_with_parse(s in "\\PC{0,12}") {
            prop_assert_eq!(validate_customer_id(&s), CustomerId::parse(&s).is_ok());
        }

        #[test]
        fn prop_next_is_deterministic_and_well_formed(s in arb_customer_id()) {
            let a = next_customer_id(Some(&s)).unwrap();
            let b = next_customer_id(Some(&s)).unwrap();
            prop_assert_eq!(a, b);
            prop_assert!(validate_customer_id(&a.to_string()));
            prop_assert_ne!(a.counter().value(), 0);
        }

        #[test]
        fn prop_next_follows_carry_rules(s in arb_customer_id()) {
            let prev = CustomerId::parse(&s).unwrap();
            let (next, rollover) = prev.next_with_rollover();

            match rollover {
                Rollover::None => {
                    prop_assert_eq!(next.counter().value(), prev.counter().value() + 1);
                    prop_assert_eq!(next.letter(), prev.letter());
                    prop_assert_eq!(next.block(), prev.block());
                    prop_assert_eq!(next.prefix(), prev.prefix());
                }
                Rollover::Letter => {
                    prop_assert_eq!(prev.counter().value(), 99);
                    prop_assert_eq!(next.counter().value(), 1);
                    prop_assert_eq!(next.letter(), prev.letter().next().0);
                    prop_assert_eq!(next.block(), prev.block());
                }
                Rollover::Block => {
                    prop_assert_eq!(prev.letter().as_char(), 'z');
                    prop_assert_eq!(next.letter().as_char(), 'a');
                    prop_assert_eq!(next.block().value(), prev.block().value() + 1);
                    prop_assert_eq!(next.prefix(), prev.prefix());
                }
                Rollover::Prefix => {
                    prop_assert_eq!(prev.block().value(), 999);
                    prop_assert_eq!(next.block().value(), 0);
                    prop_assert_eq!(next.prefix(), prev.prefix().next().0);
                }
                Rollover::Wrapped => {
                    prop_assert!(prev.is_last());
                }
            }

            if rollover != Rollover::Wrapped {
                prop_assert!(next > prev);
            }
        }
    }
}
